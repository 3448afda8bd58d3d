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
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{error, info, span, Instrument, Level};

use crate::engine::Engine;
use crate::transport::Quantization;
use crate::PadId;

pub mod keyboard;

/// Controller events that drive the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A pad was pressed.
    Pad(PadId),

    /// A pad was let go.
    Release(PadId),

    /// Arm, stop recording or toggle a loop slot.
    Slot(usize),

    /// Start or stop a recorded loop.
    Loop(usize),

    /// Toggle a column's mute.
    Mute(usize),

    /// Toggle a column's solo.
    Solo(usize),

    /// Clear a loop slot.
    Clear(usize),

    /// Launch a row.
    Scene(usize),

    /// Start the transport.
    Play,

    /// Stop the transport.
    Stop,

    Bpm(f64),

    Quantization(Quantization),

    /// Shut the controller down.
    Quit,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Feeds driver events into an engine.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(engine: Arc<Mutex<Engine>>, driver: Arc<dyn Driver>) -> Controller {
        Controller {
            handle: tokio::spawn(
                Controller::apply_events(engine, driver)
                    .instrument(span!(Level::INFO, "controller")),
            ),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    async fn apply_events(engine: Arc<Mutex<Engine>>, driver: Arc<dyn Driver>) {
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let join_handle = driver.monitor_events(events_tx);
        info!("Controller started.");

        while let Some(event) = events_rx.recv().await {
            info!(event = ?event, "Received event.");
            if event == Event::Quit {
                break;
            }
            apply(&mut engine.lock(), event);
        }

        info!("Controller closing.");
        match join_handle.await {
            Ok(Err(e)) => error!("Event monitor failed: {}", e),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
            Ok(Ok(())) => {}
        }
    }
}

/// Applies one event to the engine.
pub fn apply(engine: &mut Engine, event: Event) {
    match event {
        Event::Pad(pad) => engine.trigger_pad(pad),
        Event::Release(pad) => engine.release_pad(pad),
        Event::Slot(slot) => engine.toggle_slot(slot),
        Event::Loop(slot) => engine.toggle_loop(slot),
        Event::Mute(column) => engine.toggle_mute(column),
        Event::Solo(column) => engine.toggle_solo(column),
        Event::Clear(slot) => engine.clear_slot(slot),
        Event::Scene(row) => engine.play_scene(row),
        Event::Play => engine.start_transport(),
        Event::Stop => engine.stop_transport(),
        Event::Bpm(bpm) => engine.set_bpm(bpm),
        Event::Quantization(quantization) => engine.set_quantization(quantization),
        Event::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::engine::EngineSettings;
    use crate::looper::SlotStatus;
    use crate::state::{self, PadMapping, PerformanceState};
    use crate::testutil::MockInstrument;
    use crate::voices::InstrumentKind;

    /// Sends a fixed list of events, then closes.
    struct ScriptedDriver {
        events: Vec<Event>,
    }

    impl Driver for ScriptedDriver {
        fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
            let events = self.events.clone();
            tokio::task::spawn_blocking(move || {
                for event in events {
                    events_tx
                        .blocking_send(event)
                        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                }
                Ok(())
            })
        }
    }

    fn engine() -> (Arc<Mutex<Engine>>, MockInstrument) {
        let instrument = MockInstrument::new();
        let mut mappings = HashMap::new();
        mappings.insert(
            PadId(0),
            PadMapping::new(InstrumentKind::Drum { kit: None }, 36),
        );
        let state = state::shared(PerformanceState::new(mappings, Quantization::Bar, 6));
        let engine = Engine::new(
            EngineSettings::default(),
            Box::new(instrument.clone()),
            state,
        );
        (Arc::new(Mutex::new(engine)), instrument)
    }

    #[tokio::test]
    async fn test_controller_applies_events() {
        let (engine, instrument) = engine();
        let driver = Arc::new(ScriptedDriver {
            events: vec![
                Event::Quantization(Quantization::Quarter),
                Event::Bpm(100.0),
                Event::Slot(1),
                Event::Pad(PadId(0)),
                Event::Mute(3),
            ],
        });

        let mut controller = Controller::new(engine.clone(), driver);
        assert!(controller.join().await.is_ok());

        let engine = engine.lock();
        assert_eq!(Some(SlotStatus::Recording), engine.slot_status(1));
        assert!(engine.transport().running);
        assert_eq!(100.0, engine.transport().bpm);
        let state = engine.state();
        let state = state.read();
        assert_eq!(Quantization::Quarter, state.launch_quantization());
        assert!(state.track_states().mute[3]);
        assert_eq!(1, instrument.triggers_for(PadId(0)));
    }

    #[tokio::test]
    async fn test_quit_ignores_later_events() {
        let (engine, _) = engine();
        let driver = Arc::new(ScriptedDriver {
            events: vec![Event::Play, Event::Quit, Event::Slot(0)],
        });

        let mut controller = Controller::new(engine.clone(), driver);
        assert!(controller.join().await.is_ok());
        let engine = engine.lock();
        assert!(engine.transport().running);
        assert_eq!(Some(SlotStatus::Empty), engine.slot_status(0));
    }
}
