// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::{crate_version, Parser, Subcommand};
use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use padloop::controller::{keyboard, Controller};
use padloop::engine::{Engine, StatusEvent};
use padloop::transport::{ClockDriver, TimeSignature};
use padloop::voices::{analyze_loop_points, LoggingInstrument, SampleBuffer};
use padloop::{config, state, PadId};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A quantized loop recorder for live pad performance."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Finds a sample's onset and a bar-aligned loop region.
    Analyze {
        /// The WAV file to analyze.
        path: PathBuf,
        /// The tempo to align the loop to.
        #[arg(short, long, default_value_t = 120.0)]
        bpm: f64,
        /// Beats in one bar.
        #[arg(long, default_value_t = 4)]
        beats_per_bar: u32,
        /// The note value of one beat.
        #[arg(long, default_value_t = 4)]
        beat_unit: u32,
    },
    /// Starts a performance, reading commands from the keyboard.
    Perform {
        /// The path to the engine config.
        config_path: PathBuf,
    },
    /// Validates an engine config and prints its pad table.
    Check {
        /// The path to the engine config.
        config_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            bpm,
            beats_per_bar,
            beat_unit,
        } => {
            let buffer = SampleBuffer::from_wav(&path)?;
            let signature = TimeSignature::new(beats_per_bar, beat_unit);
            let analysis = analyze_loop_points(&buffer, bpm, signature)?;
            println!("{}:", path.display());
            println!("  duration:   {:.3}s", buffer.duration());
            println!("  onset:      {:.3}s", analysis.start_offset);
            println!("  bars:       {}", analysis.bars);
            println!(
                "  loop:       {:.3}s - {:.3}s",
                analysis.loop_points.start, analysis.loop_points.end
            );
            if analysis.clipped {
                println!("  warning:    loop end clipped to the end of the sample");
            }
        }
        Commands::Check { config_path } => {
            let config = config::load(&config_path)?;
            let settings = config.settings();
            println!(
                "{} BPM, {}/{}, {} ticks per beat, launch quantization {}, {} slots",
                settings.bpm,
                settings.time_signature.beats,
                settings.time_signature.unit,
                settings.ticks_per_beat,
                config.quantization(),
                settings.slots,
            );

            let mut pads: Vec<(&PadId, _)> = config.pads().iter().collect();
            pads.sort_by_key(|(pad, _)| **pad);
            println!("Pads (count: {}):", pads.len());
            for (pad, mapping) in pads {
                println!(
                    "- {} (row {}, column {}): {:?}, note {}, {:?}, choke group {}",
                    pad,
                    pad.row(),
                    pad.column(),
                    mapping.instrument,
                    mapping.note,
                    mapping.mode,
                    mapping
                        .choke_group
                        .map_or_else(|| "column".to_string(), |g| g.to_string()),
                );
            }
        }
        Commands::Perform { config_path } => {
            let config = config::load(&config_path)?;
            let shared = state::shared(config.performance_state());
            let engine = Arc::new(Mutex::new(Engine::new(
                config.settings(),
                Box::new(LoggingInstrument::new()),
                shared,
            )));

            let status_events = engine.lock().status_events();
            thread::Builder::new()
                .name("status".to_string())
                .spawn(move || {
                    for event in status_events.iter() {
                        match event {
                            StatusEvent::Warning(message) => warn!("{}", message),
                            event => info!(event = ?event, "Status"),
                        }
                    }
                })?;

            let clock = config.clock();
            let mut driver =
                ClockDriver::start(engine.clone(), clock.resolution(), clock.thread_priority())?;

            let mut controller = Controller::new(engine, Arc::new(keyboard::Driver::new()));
            controller.join().await?;
            driver.stop();
        }
    }

    Ok(())
}
