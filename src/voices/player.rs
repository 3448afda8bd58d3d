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

//! Voice management for pad playback.
//!
//! Handles choke-group exclusivity, gate release and loop-mode repetition.

use tracing::debug;

use super::instrument::Instrument;
use super::voice::{ChokeGroup, PlaybackMode, Voice};
use crate::action::Action;
use crate::state::PadMapping;
use crate::transport::TransportClock;
use crate::PadId;

/// Owns the instrument and one voice per sounding pad.
pub struct VoicePlayer {
    instrument: Box<dyn Instrument>,
    voices: Vec<Voice>,
}

impl VoicePlayer {
    pub fn new(instrument: Box<dyn Instrument>) -> Self {
        Self {
            instrument,
            voices: Vec::new(),
        }
    }

    /// Starts a voice for the pad. Every audible voice in the same resolved
    /// choke group is stopped first, at the same tick. Returns the pads that
    /// were choked.
    pub fn trigger(
        &mut self,
        pad: PadId,
        mapping: &PadMapping,
        clock: &mut TransportClock<Action>,
    ) -> Vec<PadId> {
        let group = ChokeGroup::resolve(pad, mapping.choke_group);
        let choked = self.stop_where(clock, |v| v.group() == group);

        let now = clock.tick();
        let time = clock.ticks_to_seconds(now);
        let loop_region = match (mapping.mode, mapping.loop_points) {
            (PlaybackMode::Loop, Some(points)) if points.length() > 0.0 => {
                Some((points, clock.seconds_to_ticks(points.length()).max(1)))
            }
            _ => None,
        };

        let mut voice = Voice::new(pad, mapping.note, mapping.mode, group, loop_region);
        match (mapping.mode, loop_region) {
            (PlaybackMode::OneShot, _) => {
                self.instrument
                    .trigger(pad, mapping.note, 0.0, mapping.duration, time);
            }
            (PlaybackMode::Gate, _) | (PlaybackMode::Loop, None) => {
                self.instrument.start_note(pad, mapping.note);
            }
            (PlaybackMode::Loop, Some((points, ticks))) => {
                self.instrument
                    .trigger(pad, mapping.note, points.start, Some(points.length()), time);
                voice.set_repeat(Some(clock.schedule(
                    now + ticks,
                    Action::VoiceRepeat {
                        voice_id: voice.id(),
                    },
                )));
            }
        }

        debug!(
            pad = pad.0,
            voice = voice.id(),
            mode = ?mapping.mode,
            group = ?group,
            choked = choked.len(),
            "Voice started"
        );
        self.voices.push(voice);
        choked
    }

    /// Plays the next repetition of a loop-mode voice. Stale voice ids are
    /// ignored.
    pub fn repeat(&mut self, voice_id: u64, clock: &mut TransportClock<Action>) {
        let Some(voice) = self.voices.iter_mut().find(|v| v.id() == voice_id) else {
            return;
        };
        let Some((points, ticks)) = voice.loop_region() else {
            return;
        };
        let now = clock.tick();
        self.instrument.trigger(
            voice.pad(),
            voice.note(),
            points.start,
            Some(points.length()),
            clock.ticks_to_seconds(now),
        );
        voice.set_repeat(Some(
            clock.schedule(now + ticks, Action::VoiceRepeat { voice_id }),
        ));
    }

    /// Handles a pad release. Only gate voices react. Returns true if a voice
    /// was stopped.
    pub fn release(&mut self, pad: PadId, clock: &mut TransportClock<Action>) -> bool {
        !self
            .stop_where(clock, |v| v.pad() == pad && v.mode() == PlaybackMode::Gate)
            .is_empty()
    }

    /// Stops every voice belonging to the pad, whatever its mode.
    pub fn stop_pad(&mut self, pad: PadId, clock: &mut TransportClock<Action>) -> bool {
        !self.stop_where(clock, |v| v.pad() == pad).is_empty()
    }

    /// Stops all voices. Returns the pads that were sounding.
    pub fn stop_all(&mut self, clock: &mut TransportClock<Action>) -> Vec<PadId> {
        self.stop_where(clock, |_| true)
    }

    /// Returns true if the pad currently has an audible voice.
    pub fn is_active(&mut self, pad: PadId) -> bool {
        self.prune_finished();
        self.voices.iter().any(|v| v.pad() == pad)
    }

    /// Pads with an audible voice, in the order they started.
    pub fn active_pads(&mut self) -> Vec<PadId> {
        self.prune_finished();
        let mut pads: Vec<PadId> = Vec::new();
        for voice in &self.voices {
            if !pads.contains(&voice.pad()) {
                pads.push(voice.pad());
            }
        }
        pads
    }

    /// Returns the current number of tracked voices.
    pub fn active_count(&mut self) -> usize {
        self.prune_finished();
        self.voices.len()
    }

    /// Drops one-shot voices the instrument reports as finished.
    fn prune_finished(&mut self) {
        let instrument = &self.instrument;
        self.voices
            .retain(|v| v.mode() != PlaybackMode::OneShot || instrument.is_playing(v.pad()));
    }

    /// Stops and removes matching audible voices, cancelling their pending
    /// repeats. Returns the affected pads without duplicates.
    fn stop_where<F>(&mut self, clock: &mut TransportClock<Action>, predicate: F) -> Vec<PadId>
    where
        F: Fn(&Voice) -> bool,
    {
        self.prune_finished();

        let mut stopped: Vec<PadId> = Vec::new();
        let mut kept = Vec::with_capacity(self.voices.len());
        for mut voice in self.voices.drain(..) {
            if !predicate(&voice) {
                kept.push(voice);
                continue;
            }
            if let Some(handle) = voice.take_repeat() {
                clock.cancel(handle);
            }
            self.instrument.stop_note(voice.pad(), voice.note());
            if !stopped.contains(&voice.pad()) {
                stopped.push(voice.pad());
            }
        }
        self.voices = kept;
        stopped
    }
}

impl std::fmt::Debug for VoicePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicePlayer")
            .field("voices", &self.voices)
            .finish()
    }
}
