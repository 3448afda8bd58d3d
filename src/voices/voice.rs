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
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::transport::ScheduleHandle;
use crate::PadId;

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// How a pad's voice behaves once triggered.
#[derive(Deserialize, Clone, Copy, Serialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Plays to completion without further management.
    #[default]
    OneShot,
    /// Sounds while the pad is held.
    Gate,
    /// Repeats between the loop points until stopped.
    Loop,
}

/// Sample loop region in seconds.
#[derive(Deserialize, Clone, Copy, Serialize, Debug, PartialEq)]
pub struct LoopPoints {
    pub start: f64,
    pub end: f64,
}

impl LoopPoints {
    pub fn length(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// A set of voices of which at most one may sound at a time. A pad's group
/// is its explicit tag when it has one, otherwise its column number, so an
/// explicit group 3 shares a group with the untagged pads of column 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChokeGroup(pub usize);

impl ChokeGroup {
    /// Resolves the effective group for a pad.
    pub fn resolve(pad: PadId, explicit: Option<u8>) -> ChokeGroup {
        ChokeGroup(explicit.map(usize::from).unwrap_or(pad.column()))
    }
}

/// One live playback instance bound to a pad.
#[derive(Debug)]
pub struct Voice {
    /// Unique ID for this voice.
    id: u64,
    /// The pad that started this voice.
    pad: PadId,
    /// The note sent to the instrument.
    note: u8,
    mode: PlaybackMode,
    group: ChokeGroup,
    /// Loop region and its length in ticks, for loop-mode voices with loop
    /// points.
    loop_region: Option<(LoopPoints, u64)>,
    /// Pending loop repetition.
    repeat: Option<ScheduleHandle>,
}

impl Voice {
    pub fn new(
        pad: PadId,
        note: u8,
        mode: PlaybackMode,
        group: ChokeGroup,
        loop_region: Option<(LoopPoints, u64)>,
    ) -> Self {
        Self {
            id: NEXT_VOICE_ID.fetch_add(1, Ordering::SeqCst),
            pad,
            note,
            mode,
            group,
            loop_region,
            repeat: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pad(&self) -> PadId {
        self.pad
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn group(&self) -> ChokeGroup {
        self.group
    }

    pub fn loop_region(&self) -> Option<(LoopPoints, u64)> {
        self.loop_region
    }

    /// Replaces the pending repeat handle, returning the previous one.
    pub fn set_repeat(&mut self, handle: Option<ScheduleHandle>) -> Option<ScheduleHandle> {
        std::mem::replace(&mut self.repeat, handle)
    }

    pub fn take_repeat(&mut self) -> Option<ScheduleHandle> {
        self.repeat.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choke_group_resolution() {
        // Pad 3 and pad 11 share column 3.
        assert_eq!(
            ChokeGroup::resolve(PadId(3), None),
            ChokeGroup::resolve(PadId(11), None)
        );
        assert_ne!(
            ChokeGroup::resolve(PadId(3), None),
            ChokeGroup::resolve(PadId(4), None)
        );
        // An explicit group 3 is the same group as column 3.
        assert_eq!(
            ChokeGroup::resolve(PadId(0), Some(3)),
            ChokeGroup::resolve(PadId(3), None)
        );
        assert_eq!(
            ChokeGroup::resolve(PadId(0), Some(7)),
            ChokeGroup::resolve(PadId(42), Some(7))
        );
        assert_ne!(
            ChokeGroup::resolve(PadId(8), Some(2)),
            ChokeGroup::resolve(PadId(0), None)
        );
    }

    #[test]
    fn test_voice_ids_are_unique() {
        let group = ChokeGroup::resolve(PadId(0), None);
        let a = Voice::new(PadId(0), 36, PlaybackMode::OneShot, group, None);
        let b = Voice::new(PadId(0), 36, PlaybackMode::OneShot, group, None);
        assert_ne!(a.id(), b.id());
    }
}
