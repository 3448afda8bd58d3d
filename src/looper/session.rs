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
use crate::PadId;

/// An in-progress recording. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSession {
    armed_slot: usize,
    waiting_for_input: bool,
    /// Grid-snapped tick of the first input; the loop's phase origin.
    start_tick: Option<u64>,
    /// Raw (tick, pad) captures in arrival order.
    events: Vec<(u64, PadId)>,
}

impl RecordingSession {
    pub fn new(armed_slot: usize) -> RecordingSession {
        RecordingSession {
            armed_slot,
            waiting_for_input: true,
            start_tick: None,
            events: Vec::new(),
        }
    }

    pub fn armed_slot(&self) -> usize {
        self.armed_slot
    }

    pub fn is_waiting_for_input(&self) -> bool {
        self.waiting_for_input
    }

    pub fn start_tick(&self) -> Option<u64> {
        self.start_tick
    }

    pub fn events(&self) -> &[(u64, PadId)] {
        &self.events
    }

    /// Captures the first input, fixing the phase origin.
    pub fn begin(&mut self, start_tick: u64, tick: u64, pad: PadId) {
        self.waiting_for_input = false;
        self.start_tick = Some(start_tick);
        self.events.push((tick, pad));
    }

    /// Captures a later input unmodified.
    pub fn capture(&mut self, tick: u64, pad: PadId) {
        self.events.push((tick, pad));
    }
}
