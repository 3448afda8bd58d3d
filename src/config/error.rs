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

/// Typed error for config load/parse and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Tempo must be a positive number of beats per minute, got {0}")]
    InvalidTempo(f64),

    #[error("Invalid time signature {beats}/{unit}")]
    InvalidTimeSignature { beats: u32, unit: u32 },

    #[error("Ticks per beat must be at least 1, got {0}")]
    InvalidTicksPerBeat(u64),

    #[error("Slot count must be between 1 and {max}, got {slots}")]
    InvalidSlots { slots: usize, max: usize },

    #[error("Pad {pad} is outside the grid (0-{max})")]
    PadOutOfRange { pad: u8, max: usize },

    #[error("Pad {0} is defined more than once")]
    DuplicatePad(u8),

    #[error("Sample pad {0} has no file")]
    MissingSampleFile(u8),

    #[error("Pad {pad} has an invalid loop region {start}..{end}")]
    InvalidLoopPoints { pad: u8, start: f64, end: f64 },
}
