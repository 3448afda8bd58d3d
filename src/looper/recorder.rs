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

//! The loop slot state machine.
//!
//! ```text
//! empty -> armed -> recording -> stopped <-> queued <-> playing
//!   ^________________ clear ________________________________|
//! ```

use tracing::{debug, info};

use super::mixer::{resolve_mutes, TrackStates};
use super::session::RecordingSession;
use super::track::{LoopEvent, LoopTrack, PendingToggle, SlotStatus};
use crate::action::Action;
use crate::transport::{Quantization, TransportClock};
use crate::PadId;

/// Default number of loop slots.
pub const DEFAULT_SLOTS: usize = 6;

/// How a recording session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Stopped while still waiting for the first input.
    ArmingCancelled { slot: usize },
    /// Stopped without any captured events.
    Empty { slot: usize },
    /// A loop was created in the slot.
    Created {
        slot: usize,
        bars: u64,
        loop_length_ticks: u64,
        events: usize,
    },
}

/// What a play/stop toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Applied at once.
    Immediate { play: bool },
    /// Waiting for the given tick.
    Queued { play: bool, at: u64 },
    /// A pending toggle was cancelled; the slot is back where it was.
    Cancelled { status: SlotStatus },
    /// The slot has no loop to toggle.
    Ignored,
}

/// Owns the slot pool and the single recording session.
#[derive(Debug)]
pub struct LoopRecorder {
    tracks: Vec<LoopTrack>,
    session: Option<RecordingSession>,
}

impl LoopRecorder {
    pub fn new(slots: usize) -> LoopRecorder {
        LoopRecorder {
            tracks: (0..slots).map(LoopTrack::new).collect(),
            session: None,
        }
    }

    pub fn track(&self, slot: usize) -> Option<&LoopTrack> {
        self.tracks.get(slot)
    }

    pub fn tracks(&self) -> &[LoopTrack] {
        &self.tracks
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    pub fn statuses(&self) -> Vec<SlotStatus> {
        self.tracks.iter().map(|t| t.status()).collect()
    }

    /// The slot holding a loop in the given column, if any.
    pub fn loop_in_column(&self, column: usize) -> Option<usize> {
        self.tracks
            .iter()
            .find(|t| t.column() == column && t.status().has_loop())
            .map(|t| t.id())
    }

    /// True while a slot is armed or recording.
    pub fn is_capturing(&self) -> bool {
        self.session.is_some()
    }

    /// Arms an empty slot. Any other armed or recording slot is stopped
    /// first through the normal stop path; that outcome is returned.
    pub fn arm(&mut self, slot: usize, clock: &mut TransportClock<Action>) -> Option<StopOutcome> {
        if self.tracks.get(slot)?.status() != SlotStatus::Empty {
            return None;
        }

        let previous = match &self.session {
            Some(session) => {
                info!(
                    previous = session.armed_slot(),
                    slot, "Arming while another slot is armed, stopping it first"
                );
                self.stop_recording(clock)
            }
            None => None,
        };

        self.tracks[slot].set_status(SlotStatus::Armed);
        self.session = Some(RecordingSession::new(slot));
        debug!(slot, "Slot armed");
        previous
    }

    /// Captures a pad trigger if a slot is armed or recording. The first
    /// input is snapped to the nearest grid line, which becomes the loop's
    /// phase origin. Returns true if the event was captured.
    pub fn record_event(
        &mut self,
        pad: PadId,
        clock: &TransportClock<Action>,
        quantization: Quantization,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let tick = clock.tick();

        if session.is_waiting_for_input() {
            // A snap that lands after the raw tick leaves this first event
            // before the origin; it wraps to the tail of the loop on stop.
            let start_tick = clock.nearest_subdivision(quantization);
            session.begin(start_tick, tick, pad);
            let slot = session.armed_slot();
            self.tracks[slot].set_status(SlotStatus::Recording);
            debug!(slot, tick, start_tick, pad = pad.0, "Recording started");
        } else {
            session.capture(tick, pad);
        }
        true
    }

    /// Ends the current session. With no captured events the slot reverts to
    /// empty. Otherwise the loop length is rounded up to whole bars and the
    /// new loop is installed stopped, phase-locked to its start tick.
    pub fn stop_recording(&mut self, clock: &mut TransportClock<Action>) -> Option<StopOutcome> {
        let session = self.session.take()?;
        let slot = session.armed_slot();

        let start_tick = match session.start_tick() {
            Some(start_tick) if !session.events().is_empty() => start_tick,
            Some(_) => {
                self.tracks[slot].reset();
                info!(slot, "Recording stopped with no events");
                return Some(StopOutcome::Empty { slot });
            }
            None => {
                self.tracks[slot].reset();
                info!(slot, "Arming cancelled before any input");
                return Some(StopOutcome::ArmingCancelled { slot });
            }
        };

        let ticks_per_bar = clock.ticks_per_bar().max(1) as i64;
        let manual_duration = clock.tick() as i64 - start_tick as i64;
        let bars = loop_bars(manual_duration, ticks_per_bar);
        let loop_length = bars * ticks_per_bar;

        let mut events: Vec<LoopEvent> = session
            .events()
            .iter()
            .map(|(tick, pad)| LoopEvent {
                tick: (*tick as i64 - start_tick as i64).rem_euclid(loop_length) as u64,
                pad: *pad,
            })
            .collect();
        // Stable, so hits sharing a tick keep their recorded order.
        events.sort_by_key(|e| e.tick);
        let event_count = events.len();

        let track = &mut self.tracks[slot];
        track.install(events, loop_length as u64, start_tick);
        let cycle_start = start_tick as i64
            + (clock.tick() as i64 - start_tick as i64).div_euclid(loop_length) * loop_length;
        schedule_cycle(track, cycle_start, clock);

        info!(
            slot,
            bars,
            loop_length,
            events = event_count,
            phase_origin = start_tick,
            "Loop recorded"
        );
        Some(StopOutcome::Created {
            slot,
            bars: bars as u64,
            loop_length_ticks: loop_length as u64,
            events: event_count,
        })
    }

    /// Toggles a recorded loop between playing and stopped. With
    /// quantization off or the transport stopped the change is immediate.
    /// Otherwise stops land at the end of the current repetition and starts
    /// on the next grid line, and the slot shows queued until then. Toggling
    /// a queued slot cancels the pending change.
    pub fn toggle_playback(
        &mut self,
        slot: usize,
        clock: &mut TransportClock<Action>,
        quantization: Quantization,
    ) -> ToggleOutcome {
        let Some(track) = self.tracks.get_mut(slot) else {
            return ToggleOutcome::Ignored;
        };

        if let Some(pending) = track.take_pending() {
            clock.cancel(pending.handle);
            let status = if pending.play {
                SlotStatus::Stopped
            } else {
                SlotStatus::Playing
            };
            track.set_status(status);
            debug!(slot, %status, "Pending toggle cancelled");
            return ToggleOutcome::Cancelled { status };
        }

        let play = match track.status() {
            SlotStatus::Playing => false,
            SlotStatus::Stopped => true,
            _ => return ToggleOutcome::Ignored,
        };

        if quantization.is_none() || !clock.is_running() {
            track.set_playing(play);
            return ToggleOutcome::Immediate { play };
        }

        let at = if play {
            clock.next_subdivision(quantization)
        } else {
            let length = track.loop_length_ticks().max(1) as i64;
            let into_loop =
                (clock.tick() as i64 - track.phase_origin_tick() as i64).rem_euclid(length);
            clock.tick() + (length - into_loop) as u64
        };
        let handle = clock.schedule(
            at,
            Action::ApplyToggle {
                slot,
                generation: track.generation(),
                play,
            },
        );
        track.set_pending(PendingToggle { handle, play });
        track.set_status(SlotStatus::Queued);
        debug!(slot, play, at, "Toggle queued");
        ToggleOutcome::Queued { play, at }
    }

    /// Applies a queued toggle when its tick arrives. Returns false for
    /// stale actions.
    pub fn apply_toggle(&mut self, slot: usize, generation: u64, play: bool) -> bool {
        let Some(track) = self.tracks.get_mut(slot) else {
            return false;
        };
        if track.generation() != generation || !track.has_pending_toggle() {
            return false;
        }
        track.take_pending();
        track.set_playing(play);
        debug!(slot, play, "Queued toggle applied");
        true
    }

    /// Makes a recorded loop play right away, cancelling any pending toggle.
    pub fn resume(&mut self, slot: usize, clock: &mut TransportClock<Action>) -> bool {
        let Some(track) = self.tracks.get_mut(slot) else {
            return false;
        };
        if !track.status().has_loop() {
            return false;
        }
        if let Some(pending) = track.take_pending() {
            clock.cancel(pending.handle);
        }
        track.set_playing(true);
        true
    }

    /// Clears a slot back to empty from any state, discarding a session
    /// that targets it.
    pub fn clear(&mut self, slot: usize, clock: &mut TransportClock<Action>) -> bool {
        let Some(track) = self.tracks.get_mut(slot) else {
            return false;
        };
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.armed_slot() == slot)
        {
            self.session = None;
        }
        for handle in track.reset() {
            clock.cancel(handle);
        }
        info!(slot, "Slot cleared");
        true
    }

    /// Schedules the hits of one loop repetition starting at `cycle_start`
    /// and the start of the next repetition.
    pub fn on_cycle(
        &mut self,
        slot: usize,
        generation: u64,
        cycle_start: u64,
        clock: &mut TransportClock<Action>,
    ) {
        let Some(track) = self.tracks.get_mut(slot) else {
            return;
        };
        if track.generation() != generation || !track.status().has_loop() {
            return;
        }
        schedule_cycle(track, cycle_start as i64, clock);
    }

    /// Whether a scheduled loop hit should sound.
    pub fn is_note_audible(&self, slot: usize, generation: u64) -> bool {
        self.tracks.get(slot).is_some_and(|t| {
            t.generation() == generation && t.status().has_loop() && !t.is_muted()
        })
    }

    /// Recomputes loop audibility from the mixer flags.
    pub fn resolve_mutes(&mut self, states: &TrackStates) {
        resolve_mutes(&mut self.tracks, states);
    }
}

/// Whole bars needed to hold the recorded duration; never less than one.
fn loop_bars(duration_ticks: i64, ticks_per_bar: i64) -> i64 {
    if duration_ticks <= 0 {
        return 1;
    }
    ((duration_ticks + ticks_per_bar - 1) / ticks_per_bar).max(1)
}

fn schedule_cycle(track: &mut LoopTrack, cycle_start: i64, clock: &mut TransportClock<Action>) {
    let now = clock.tick() as i64;
    let slot = track.id();
    let generation = track.generation();
    for event in track.events() {
        let at = cycle_start + event.tick as i64;
        if at >= now {
            clock.schedule(
                at as u64,
                Action::LoopNote {
                    slot,
                    generation,
                    pad: event.pad,
                },
            );
        }
    }
    let next = (cycle_start + track.loop_length_ticks() as i64).max(now);
    track.set_cycle(clock.schedule(next as u64, Action::LoopCycle { slot, generation }));
}
