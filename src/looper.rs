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

//! Loop recording.
//!
//! A fixed pool of slots, each of which can be armed, recorded into, and then
//! toggled between playing and stopped on the launch grid. Recorded loops are
//! anchored to the tick the recording started on so they stay bar-locked.

mod mixer;
mod recorder;
mod session;
mod track;

pub use mixer::{resolve_mutes, TrackStates};
pub use recorder::{LoopRecorder, StopOutcome, ToggleOutcome, DEFAULT_SLOTS};
pub use session::RecordingSession;
pub use track::{LoopEvent, LoopTrack, SlotStatus};
