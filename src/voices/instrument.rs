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
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::PadId;

/// The sound source assigned to a pad. Resolved once when the pad is
/// mapped; the engine never inspects it when triggering.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstrumentKind {
    /// A sample file.
    Sample { file: String },
    /// A synth patch.
    Synth {
        #[serde(default)]
        preset: Option<String>,
    },
    /// A drum kit piece.
    Drum {
        #[serde(default)]
        kit: Option<String>,
    },
}

/// The sound-generation layer. Implementations decide what a pad sounds
/// like; the engine only decides when it sounds.
pub trait Instrument: Send {
    /// Plays a note for a fixed duration (or to completion when None),
    /// starting at `time` seconds on the transport timeline. Playback begins
    /// `offset` seconds into the sound, which is how loop-mode pads honor
    /// their loop start.
    fn trigger(&mut self, pad: PadId, note: u8, offset: f64, duration: Option<f64>, time: f64);

    /// Starts a sustained note.
    fn start_note(&mut self, pad: PadId, note: u8);

    /// Stops any sound the pad is making.
    fn stop_note(&mut self, pad: PadId, note: u8);

    /// Returns true while the pad is audible.
    fn is_playing(&self, pad: PadId) -> bool;
}

/// An instrument that makes no sound and logs every call. Sustained notes
/// are tracked so gate and loop voices report as playing; one-shots finish
/// immediately.
#[derive(Debug, Default)]
pub struct LoggingInstrument {
    sustained: HashSet<PadId>,
}

impl LoggingInstrument {
    pub fn new() -> LoggingInstrument {
        LoggingInstrument::default()
    }
}

impl Instrument for LoggingInstrument {
    fn trigger(&mut self, pad: PadId, note: u8, offset: f64, duration: Option<f64>, time: f64) {
        info!(pad = pad.0, note, offset, duration, time, "Trigger");
    }

    fn start_note(&mut self, pad: PadId, note: u8) {
        info!(pad = pad.0, note, "Note start");
        self.sustained.insert(pad);
    }

    fn stop_note(&mut self, pad: PadId, note: u8) {
        if self.sustained.remove(&pad) {
            info!(pad = pad.0, note, "Note stop");
        }
    }

    fn is_playing(&self, pad: PadId) -> bool {
        self.sustained.contains(&pad)
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        instrument: InstrumentKind,
    }

    #[test]
    fn test_instrument_kind_deserialize() {
        let yaml = r#"
            instrument:
              type: sample
              file: kick.wav
        "#;
        let wrapper: Wrapper = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(
            InstrumentKind::Sample {
                file: "kick.wav".to_string()
            },
            wrapper.instrument
        );

        let yaml = r#"
            instrument:
              type: drum
        "#;
        let wrapper: Wrapper = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(InstrumentKind::Drum { kit: None }, wrapper.instrument);
    }

    #[test]
    fn test_logging_instrument_tracks_sustain() {
        let mut instrument = LoggingInstrument::new();
        instrument.trigger(PadId(1), 60, 0.0, Some(0.5), 0.0);
        assert!(!instrument.is_playing(PadId(1)));

        instrument.start_note(PadId(2), 62);
        assert!(instrument.is_playing(PadId(2)));
        instrument.stop_note(PadId(2), 62);
        assert!(!instrument.is_playing(PadId(2)));
    }
}
