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

//! Performance state shared with the outside world.
//!
//! The engine reads pad mappings and launch quantization from here and writes
//! slot statuses and mixer flags back. Every write replaces a whole field so
//! readers never observe a partially applied update.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::looper::{SlotStatus, TrackStates};
use crate::transport::Quantization;
use crate::voices::{InstrumentKind, LoopPoints, PlaybackMode};
use crate::PadId;

/// What a pad plays and how.
#[derive(Clone, Debug, PartialEq)]
pub struct PadMapping {
    pub instrument: InstrumentKind,
    pub note: u8,
    pub mode: PlaybackMode,
    pub choke_group: Option<u8>,
    /// Seconds a one-shot should sound for; the instrument decides if unset.
    pub duration: Option<f64>,
    pub loop_points: Option<LoopPoints>,
}

impl PadMapping {
    pub fn new(instrument: InstrumentKind, note: u8) -> PadMapping {
        PadMapping {
            instrument,
            note,
            mode: PlaybackMode::default(),
            choke_group: None,
            duration: None,
            loop_points: None,
        }
    }

    pub fn with_mode(self, mode: PlaybackMode) -> PadMapping {
        PadMapping { mode, ..self }
    }

    pub fn with_choke_group(self, choke_group: Option<u8>) -> PadMapping {
        PadMapping {
            choke_group,
            ..self
        }
    }

    pub fn with_loop_points(self, loop_points: Option<LoopPoints>) -> PadMapping {
        PadMapping {
            loop_points,
            ..self
        }
    }
}

/// Snapshot of everything a performer can see or change.
#[derive(Clone, Debug, Default)]
pub struct PerformanceState {
    pad_mappings: HashMap<PadId, PadMapping>,
    launch_quantization: Quantization,
    loop_slots: Vec<SlotStatus>,
    track_states: TrackStates,
}

impl PerformanceState {
    pub fn new(
        pad_mappings: HashMap<PadId, PadMapping>,
        launch_quantization: Quantization,
        slots: usize,
    ) -> PerformanceState {
        PerformanceState {
            pad_mappings,
            launch_quantization,
            loop_slots: vec![SlotStatus::Empty; slots],
            track_states: TrackStates::default(),
        }
    }

    pub fn pad_mapping(&self, pad: PadId) -> Option<&PadMapping> {
        self.pad_mappings.get(&pad)
    }

    pub fn pad_mappings(&self) -> &HashMap<PadId, PadMapping> {
        &self.pad_mappings
    }

    pub fn launch_quantization(&self) -> Quantization {
        self.launch_quantization
    }

    pub fn loop_slots(&self) -> &[SlotStatus] {
        &self.loop_slots
    }

    pub fn track_states(&self) -> TrackStates {
        self.track_states
    }

    /// Replaces the mapping for one pad, or removes it with `None`.
    pub fn set_pad_mapping(&mut self, pad: PadId, mapping: Option<PadMapping>) {
        match mapping {
            Some(mapping) => {
                self.pad_mappings.insert(pad, mapping);
            }
            None => {
                self.pad_mappings.remove(&pad);
            }
        }
    }

    pub fn set_launch_quantization(&mut self, quantization: Quantization) {
        self.launch_quantization = quantization;
    }

    pub fn set_loop_slots(&mut self, loop_slots: Vec<SlotStatus>) {
        self.loop_slots = loop_slots;
    }

    pub fn set_track_states(&mut self, track_states: TrackStates) {
        self.track_states = track_states;
    }
}

/// State handle passed to the engine and to anyone observing it.
pub type SharedState = Arc<RwLock<PerformanceState>>;

pub fn shared(state: PerformanceState) -> SharedState {
    Arc::new(RwLock::new(state))
}
