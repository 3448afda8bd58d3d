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

//! Pad voice playback.
//!
//! This module provides:
//! - The instrument contract the engine drives (trigger/start/stop/is-playing)
//! - Voice tracking with choke-group exclusivity and playback modes
//! - Transient analysis for tempo-aligned sample loop points

mod analyzer;
mod instrument;
mod player;
mod voice;

pub use analyzer::{analyze_loop_points, AnalysisError, LoopAnalysis, SampleBuffer, ONSET_THRESHOLD};
pub use instrument::{Instrument, InstrumentKind, LoggingInstrument};
pub use player::VoicePlayer;
pub use voice::{ChokeGroup, LoopPoints, PlaybackMode, Voice};
