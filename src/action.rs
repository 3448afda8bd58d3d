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

/// Deferred work placed on the transport queue. The engine executes each
/// action when the transport reaches its tick.
///
/// Actions that refer to a loop track carry the track's generation so that
/// an action scheduled for a track that has since been cleared or re-recorded
/// is skipped rather than applied to the wrong loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Start of one repetition of a loop track.
    LoopCycle { slot: usize, generation: u64 },
    /// One recorded pad hit inside a loop repetition.
    LoopNote {
        slot: usize,
        generation: u64,
        pad: PadId,
    },
    /// A quantized play/stop toggle landing on its grid line.
    ApplyToggle {
        slot: usize,
        generation: u64,
        play: bool,
    },
    /// Loop-mode voice reaching its loop end.
    VoiceRepeat { voice_id: u64 },
    /// Scene launch: stop a sibling pad in the launched column.
    SceneStop { pad: PadId },
    /// Scene launch: start the launched pad.
    SceneStart { pad: PadId },
}

impl Action {
    /// Actions that change what is audible. When several actions share a
    /// tick these run before the notes of that tick.
    pub fn applies_first(&self) -> bool {
        matches!(self, Action::ApplyToggle { .. } | Action::SceneStop { .. })
    }
}
