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

//! Quantized loop recording and playback scheduling for a live pad instrument.
//!
//! The [`engine::Engine`] ties together:
//! - a tick-based transport clock with a cancellable callback queue
//! - a voice player enforcing choke groups and playback modes
//! - a loop recorder that turns free-timed pad triggers into bar-locked loops
//! - a scene launcher that fires a whole row of pads at once

pub mod action;
pub mod config;
pub mod controller;
pub mod engine;
pub mod looper;
pub mod playsync;
pub mod scene;
pub mod state;
pub mod transport;
pub mod voices;

#[cfg(test)]
mod testutil;

/// Number of pad columns on the grid.
pub const NUM_COLUMNS: usize = 8;

/// Number of pad rows on the grid.
pub const NUM_ROWS: usize = 8;

/// Total number of addressable pads.
pub const NUM_PADS: usize = NUM_COLUMNS * NUM_ROWS;

/// Identifies a pad on the grid. Pads are numbered row-major, so the column
/// is `id % NUM_COLUMNS` and the row is `id / NUM_COLUMNS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PadId(pub u8);

impl PadId {
    /// Builds the pad id at the given row and column.
    pub fn at(row: usize, column: usize) -> PadId {
        PadId((row * NUM_COLUMNS + column) as u8)
    }

    /// The column this pad sits in.
    pub fn column(self) -> usize {
        usize::from(self.0) % NUM_COLUMNS
    }

    /// The row this pad sits in.
    pub fn row(self) -> usize {
        usize::from(self.0) / NUM_COLUMNS
    }
}

impl std::fmt::Display for PadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
