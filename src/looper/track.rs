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
use std::fmt;

use crate::transport::ScheduleHandle;
use crate::PadId;

/// The state of a loop slot as shown to the performer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SlotStatus {
    #[default]
    Empty,
    Armed,
    Recording,
    Playing,
    Stopped,
    Queued,
}

impl SlotStatus {
    /// True for statuses that hold a recorded loop.
    pub fn has_loop(self) -> bool {
        matches!(
            self,
            SlotStatus::Playing | SlotStatus::Stopped | SlotStatus::Queued
        )
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotStatus::Empty => "empty",
            SlotStatus::Armed => "armed",
            SlotStatus::Recording => "recording",
            SlotStatus::Playing => "playing",
            SlotStatus::Stopped => "stopped",
            SlotStatus::Queued => "queued",
        };
        write!(f, "{}", name)
    }
}

/// One pad hit inside a loop, relative to the loop's phase origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopEvent {
    pub tick: u64,
    pub pad: PadId,
}

/// A play/stop toggle waiting for its grid line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct PendingToggle {
    pub handle: ScheduleHandle,
    pub play: bool,
}

/// One loop slot. Slots are never destroyed; clearing resets them to empty.
#[derive(Debug)]
pub struct LoopTrack {
    id: usize,
    status: SlotStatus,
    /// Bumped every time the slot's content changes so stale scheduled
    /// actions can be recognized.
    generation: u64,
    events: Vec<LoopEvent>,
    loop_length_ticks: u64,
    phase_origin_tick: u64,
    /// Stopped by the performer, independent of column mute/solo.
    is_loop_stopped: bool,
    /// Result of the last mute resolution pass.
    muted: bool,
    pending: Option<PendingToggle>,
    cycle: Option<ScheduleHandle>,
}

impl LoopTrack {
    pub fn new(id: usize) -> LoopTrack {
        LoopTrack {
            id,
            status: SlotStatus::Empty,
            generation: 0,
            events: Vec::new(),
            loop_length_ticks: 0,
            phase_origin_tick: 0,
            is_loop_stopped: false,
            muted: false,
            pending: None,
            cycle: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Slots map one to one onto grid columns.
    pub fn column(&self) -> usize {
        self.id
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn events(&self) -> &[LoopEvent] {
        &self.events
    }

    pub fn loop_length_ticks(&self) -> u64 {
        self.loop_length_ticks
    }

    pub fn phase_origin_tick(&self) -> u64 {
        self.phase_origin_tick
    }

    pub fn is_loop_stopped(&self) -> bool {
        self.is_loop_stopped
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn has_pending_toggle(&self) -> bool {
        self.pending.is_some()
    }

    pub(super) fn set_status(&mut self, status: SlotStatus) {
        self.status = status;
    }

    pub(super) fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Marks the loop playing or stopped right away.
    pub(super) fn set_playing(&mut self, play: bool) {
        self.status = if play {
            SlotStatus::Playing
        } else {
            SlotStatus::Stopped
        };
        self.is_loop_stopped = !play;
    }

    pub(super) fn take_pending(&mut self) -> Option<PendingToggle> {
        self.pending.take()
    }

    pub(super) fn set_pending(&mut self, pending: PendingToggle) {
        self.pending = Some(pending);
    }

    pub(super) fn set_cycle(&mut self, handle: ScheduleHandle) {
        self.cycle = Some(handle);
    }

    /// Installs a freshly recorded loop. It starts silent.
    pub(super) fn install(&mut self, events: Vec<LoopEvent>, loop_length_ticks: u64, phase_origin_tick: u64) {
        self.generation += 1;
        self.events = events;
        self.loop_length_ticks = loop_length_ticks;
        self.phase_origin_tick = phase_origin_tick;
        self.set_playing(false);
        self.muted = true;
        self.pending = None;
        self.cycle = None;
    }

    /// Resets to empty, returning every handle that still needs cancelling.
    pub(super) fn reset(&mut self) -> Vec<ScheduleHandle> {
        let mut handles = Vec::new();
        if let Some(pending) = self.pending.take() {
            handles.push(pending.handle);
        }
        if let Some(cycle) = self.cycle.take() {
            handles.push(cycle);
        }
        self.generation += 1;
        self.status = SlotStatus::Empty;
        self.events.clear();
        self.loop_length_ticks = 0;
        self.phase_origin_tick = 0;
        self.is_loop_stopped = false;
        self.muted = false;
        handles
    }
}
