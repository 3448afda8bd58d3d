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

//! The performance engine.
//!
//! Ties the transport, the voice player, the loop recorder and the scene
//! launcher together behind the operations a controller calls. All work is
//! cooperative: operations either act at once or schedule an [`Action`] on the
//! transport, and [`Engine::advance_to`] runs whatever comes due.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::looper::{LoopRecorder, SlotStatus, StopOutcome, TrackStates, DEFAULT_SLOTS};
use crate::scene::{self, SceneContext, SceneLauncher, SceneStep};
use crate::state::SharedState;
use crate::transport::{
    Quantization, TimeSignature, TransportClock, TransportState, DEFAULT_TICKS_PER_BEAT,
};
use crate::voices::{
    analyze_loop_points, AnalysisError, Instrument, LoopAnalysis, PlaybackMode, SampleBuffer,
    VoicePlayer,
};
use crate::{PadId, NUM_COLUMNS, NUM_PADS};

/// Fixed-at-startup transport parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub ticks_per_beat: u64,
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub slots: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            bpm: 120.0,
            time_signature: TimeSignature::default(),
            slots: DEFAULT_SLOTS,
        }
    }
}

/// Updates published for whoever renders the performance.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    SlotStatus { slot: usize, status: SlotStatus },
    PadActive { pad: PadId, active: bool },
    TrackStates(TrackStates),
    TransportChanged(TransportState),
    Warning(String),
}

pub struct Engine {
    clock: TransportClock<Action>,
    voices: VoicePlayer,
    recorder: LoopRecorder,
    scenes: SceneLauncher,
    state: SharedState,
    /// One sender per status subscriber. Senders whose receiver was dropped
    /// are pruned on the next publish.
    subscribers: Vec<Sender<StatusEvent>>,
    /// Last published slot statuses and active pads, for diffing.
    published_slots: Vec<SlotStatus>,
    published_pads: Vec<PadId>,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        instrument: Box<dyn Instrument>,
        state: SharedState,
    ) -> Engine {
        let recorder = LoopRecorder::new(settings.slots);
        let published_slots = recorder.statuses();
        state.write().set_loop_slots(published_slots.clone());

        info!(
            ticks_per_beat = settings.ticks_per_beat,
            bpm = settings.bpm,
            beats = settings.time_signature.beats,
            unit = settings.time_signature.unit,
            slots = settings.slots,
            "Engine created"
        );
        Engine {
            clock: TransportClock::new(
                settings.ticks_per_beat,
                settings.bpm,
                settings.time_signature,
            ),
            voices: VoicePlayer::new(instrument),
            recorder,
            scenes: SceneLauncher::new(),
            state,
            subscribers: Vec::new(),
            published_slots,
            published_pads: Vec::new(),
        }
    }

    /// Subscribes to status updates. Each subscriber gets every event
    /// published after it subscribed. Nothing is queued while there are no
    /// subscribers.
    pub fn status_events(&mut self) -> Receiver<StatusEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    pub fn transport(&self) -> TransportState {
        self.clock.state()
    }

    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    pub fn recorder(&self) -> &LoopRecorder {
        &self.recorder
    }

    pub fn slot_status(&self, slot: usize) -> Option<SlotStatus> {
        self.recorder.track(slot).map(|t| t.status())
    }

    pub fn is_pad_active(&mut self, pad: PadId) -> bool {
        self.voices.is_active(pad)
    }

    pub fn pending_actions(&self) -> usize {
        self.clock.pending_count()
    }

    /// Arms an empty slot, stops an armed or recording one, and toggles
    /// playback of a recorded one.
    pub fn toggle_slot(&mut self, slot: usize) {
        let Some(status) = self.slot_status(slot) else {
            warn!(slot, "No such loop slot");
            return;
        };

        match status {
            SlotStatus::Empty => {
                if !self.clock.is_running() {
                    self.start_transport();
                }
                if let Some(outcome) = self.recorder.arm(slot, &mut self.clock) {
                    self.on_recording_stopped(outcome);
                }
            }
            SlotStatus::Armed | SlotStatus::Recording => {
                if let Some(outcome) = self.recorder.stop_recording(&mut self.clock) {
                    self.on_recording_stopped(outcome);
                }
            }
            SlotStatus::Playing | SlotStatus::Stopped | SlotStatus::Queued => {
                self.toggle_loop(slot);
                return;
            }
        }
        self.sync();
    }

    /// Captures a pad hit into the armed or recording slot, if any.
    pub fn record_event(&mut self, pad: PadId) {
        let quantization = self.launch_quantization();
        if self.recorder.record_event(pad, &self.clock, quantization) {
            self.sync();
        }
    }

    /// Starts or stops a recorded loop on the launch grid.
    pub fn toggle_loop(&mut self, slot: usize) {
        let quantization = self.launch_quantization();
        let outcome = self
            .recorder
            .toggle_playback(slot, &mut self.clock, quantization);
        debug!(slot, ?outcome, "Loop toggled");
        self.sync();
    }

    pub fn toggle_mute(&mut self, column: usize) {
        if column >= NUM_COLUMNS {
            warn!(column, "No such column");
            return;
        }
        let states = self.track_states().toggled_mute(column);
        self.set_track_states(states);
        self.sync();
    }

    pub fn toggle_solo(&mut self, column: usize) {
        if column >= NUM_COLUMNS {
            warn!(column, "No such column");
            return;
        }
        let states = self.track_states().toggled_solo(column);
        self.set_track_states(states);
        self.sync();
    }

    pub fn clear_slot(&mut self, slot: usize) {
        if !self.recorder.clear(slot, &mut self.clock) {
            warn!(slot, "No such loop slot");
            return;
        }
        self.sync();
    }

    /// Launches one row of pads.
    pub fn play_scene(&mut self, row: usize) {
        let quantization = self.launch_quantization();
        let active_pads = self.voices.active_pads();
        let mut loops = [None; NUM_COLUMNS];
        for (column, slot) in loops.iter_mut().enumerate() {
            *slot = self.recorder.loop_in_column(column);
        }

        let plan = {
            let state = self.state.read();
            let context = SceneContext {
                mappings: state.pad_mappings(),
                loops,
                active_pads: &active_pads,
                quantized: !quantization.is_none(),
                running: self.clock.is_running(),
                launch_tick: self.clock.next_subdivision(quantization),
            };
            scene::plan(row, &context)
        };
        info!(row, steps = plan.steps.len(), "Launching scene");

        if plan.start_transport {
            self.start_transport();
        }
        for step in plan.steps {
            self.scenes.cancel_column(step.column(), &mut self.clock);
            match step {
                SceneStep::Resume { slot, column } => {
                    self.recorder.resume(slot, &mut self.clock);
                    let states = self.track_states().with_mute(column, false);
                    self.set_track_states(states);
                }
                SceneStep::StartNow { pad, stop } => {
                    if let Some(sibling) = stop {
                        self.voices.stop_pad(sibling, &mut self.clock);
                    }
                    self.play_pad(pad);
                }
                SceneStep::StartDeferred { pad, sibling, at } => {
                    self.scenes.defer(pad, sibling, at, &mut self.clock);
                }
            }
        }
        self.sync();
    }

    /// A pad was pressed. Plays it and captures it into an active recording.
    /// Pressing a sounding loop-mode pad stops it instead.
    pub fn trigger_pad(&mut self, pad: PadId) {
        if usize::from(pad.0) >= NUM_PADS {
            warn!(pad = pad.0, "No such pad");
            return;
        }
        let Some(mapping) = self.state.read().pad_mapping(pad).cloned() else {
            debug!(pad = pad.0, "Pad has no mapping, ignoring trigger");
            return;
        };

        if self.recorder.is_capturing() {
            let quantization = self.launch_quantization();
            self.recorder.record_event(pad, &self.clock, quantization);
        }

        if mapping.mode == PlaybackMode::Loop && self.voices.is_active(pad) {
            self.voices.stop_pad(pad, &mut self.clock);
        } else {
            self.voices.trigger(pad, &mapping, &mut self.clock);
        }
        self.sync();
    }

    /// A pad was let go. Only gate voices respond.
    pub fn release_pad(&mut self, pad: PadId) {
        if self.voices.release(pad, &mut self.clock) {
            self.sync();
        }
    }

    pub fn start_transport(&mut self) {
        if self.clock.is_running() {
            return;
        }
        self.clock.start();
        info!(tick = self.clock.tick(), "Transport running");
        self.publish(StatusEvent::TransportChanged(self.clock.state()));
    }

    /// Pauses the transport and silences every voice. The tick position is
    /// kept.
    pub fn stop_transport(&mut self) {
        if !self.clock.is_running() {
            return;
        }
        self.clock.stop();
        self.voices.stop_all(&mut self.clock);
        info!(tick = self.clock.tick(), "Transport stopped");
        self.publish(StatusEvent::TransportChanged(self.clock.state()));
        self.sync();
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        if !bpm.is_finite() || bpm <= 0.0 {
            warn!(bpm, "Ignoring invalid tempo");
            return;
        }
        self.clock.set_bpm(bpm);
        info!(bpm, "Tempo changed");
        self.publish(StatusEvent::TransportChanged(self.clock.state()));
    }

    pub fn set_quantization(&mut self, quantization: Quantization) {
        self.state.write().set_launch_quantization(quantization);
        info!(%quantization, "Launch quantization changed");
    }

    /// Finds the sample's onset and a bar-aligned loop at the current tempo,
    /// storing the loop points on the pad's mapping when it has one.
    pub fn analyze_pad(
        &mut self,
        pad: PadId,
        buffer: &SampleBuffer,
    ) -> Result<LoopAnalysis, AnalysisError> {
        let analysis =
            analyze_loop_points(buffer, self.clock.bpm(), self.clock.time_signature())?;
        if analysis.clipped {
            self.publish(StatusEvent::Warning(format!(
                "pad {}: loop of {} bar(s) runs past the end of the sample and was clipped",
                pad, analysis.bars
            )));
        }

        let mut state = self.state.write();
        let current = state.pad_mapping(pad).cloned();
        match current {
            Some(mapping) => {
                let mapping = mapping.with_loop_points(Some(analysis.loop_points));
                state.set_pad_mapping(pad, Some(mapping));
                debug!(
                    pad = pad.0,
                    start = analysis.loop_points.start,
                    end = analysis.loop_points.end,
                    "Stored loop points"
                );
            }
            None => debug!(pad = pad.0, "Pad has no mapping, loop points not stored"),
        }
        Ok(analysis)
    }

    /// Advances the transport by a number of ticks.
    pub fn advance(&mut self, ticks: u64) {
        let target = self.clock.tick() + ticks;
        self.advance_to(target);
    }

    /// Advances the transport by wall-clock time at the current tempo.
    pub fn advance_by(&mut self, elapsed: Duration) {
        let target = self.clock.target_for_elapsed(elapsed);
        self.advance_to(target);
    }

    /// Runs every action due up to `target` in tick order. Actions sharing a
    /// tick run in the order they were scheduled, except that play/stop
    /// changes apply before the notes of that tick. Does nothing while the
    /// transport is stopped.
    pub fn advance_to(&mut self, target: u64) {
        let mut fired = false;
        while let Some((tick, first)) = self.clock.next_due(target) {
            let mut batch = vec![first];
            while let Some((_, action)) = self.clock.next_due(tick) {
                batch.push(action);
            }
            batch.sort_by_key(|action| !action.applies_first());
            for action in batch {
                self.dispatch(tick, action);
            }
            fired = true;
        }
        if fired {
            self.sync();
        }
    }

    fn dispatch(&mut self, tick: u64, action: Action) {
        match action {
            Action::LoopCycle { slot, generation } => {
                self.recorder
                    .on_cycle(slot, generation, tick, &mut self.clock);
            }
            Action::LoopNote {
                slot,
                generation,
                pad,
            } => {
                if self.recorder.is_note_audible(slot, generation) {
                    self.play_pad(pad);
                }
            }
            Action::ApplyToggle {
                slot,
                generation,
                play,
            } => {
                if self.recorder.apply_toggle(slot, generation, play) {
                    let states = self.track_states();
                    self.recorder.resolve_mutes(&states);
                }
            }
            Action::VoiceRepeat { voice_id } => self.voices.repeat(voice_id, &mut self.clock),
            Action::SceneStop { pad } => {
                self.voices.stop_pad(pad, &mut self.clock);
            }
            Action::SceneStart { pad } => self.play_pad(pad),
        }
    }

    /// Sounds a pad from a loop or scene. Unmapped pads are ignored.
    fn play_pad(&mut self, pad: PadId) {
        let Some(mapping) = self.state.read().pad_mapping(pad).cloned() else {
            debug!(pad = pad.0, "Pad has no mapping, nothing to play");
            return;
        };
        self.voices.trigger(pad, &mapping, &mut self.clock);
    }

    fn on_recording_stopped(&mut self, outcome: StopOutcome) {
        if let StopOutcome::Created { slot, .. } = outcome {
            // A new loop must be audible once resumed.
            let column = slot % NUM_COLUMNS;
            let states = self.track_states();
            if states.mute[column] {
                self.set_track_states(states.with_mute(column, false));
            }
        }
    }

    fn launch_quantization(&self) -> Quantization {
        self.state.read().launch_quantization()
    }

    fn track_states(&self) -> TrackStates {
        self.state.read().track_states()
    }

    fn set_track_states(&mut self, states: TrackStates) {
        self.state.write().set_track_states(states);
        self.publish(StatusEvent::TrackStates(states));
    }

    /// Re-resolves mutes and publishes whatever changed since last time.
    fn sync(&mut self) {
        let states = self.track_states();
        self.recorder.resolve_mutes(&states);

        let statuses = self.recorder.statuses();
        if statuses != self.published_slots {
            for (slot, status) in statuses.iter().enumerate() {
                if self.published_slots.get(slot) != Some(status) {
                    self.publish(StatusEvent::SlotStatus {
                        slot,
                        status: *status,
                    });
                }
            }
            self.state.write().set_loop_slots(statuses.clone());
            self.published_slots = statuses;
        }

        let active = self.voices.active_pads();
        let previous = std::mem::take(&mut self.published_pads);
        for pad in &previous {
            if !active.contains(pad) {
                self.publish(StatusEvent::PadActive {
                    pad: *pad,
                    active: false,
                });
            }
        }
        for pad in &active {
            if !previous.contains(pad) {
                self.publish(StatusEvent::PadActive {
                    pad: *pad,
                    active: true,
                });
            }
        }
        self.published_pads = active;
    }

    fn publish(&mut self, event: StatusEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("transport", &self.clock.state())
            .field("slots", &self.published_slots)
            .field("active_pads", &self.published_pads)
            .finish()
    }
}
