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
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::state::PadMapping;
use crate::voices::{InstrumentKind, LoopPoints, PlaybackMode};
use crate::{PadId, NUM_PADS};

/// The sound source family of a pad.
#[derive(Deserialize, Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PadType {
    Sample,
    Synth,
    Drum,
}

/// A YAML representation of a pad assignment.
#[derive(Deserialize, Clone, Serialize, Debug)]
pub struct PadDefinition {
    /// Grid index, row * 8 + column.
    pad: u8,

    #[serde(rename = "type")]
    pad_type: PadType,

    /// Sample file, required for sample pads.
    file: Option<String>,

    /// Synth preset name.
    preset: Option<String>,

    /// Drum kit name.
    kit: Option<String>,

    /// The note sent to the instrument.
    #[serde(default = "default_note")]
    note: u8,

    #[serde(default)]
    mode: PlaybackMode,

    /// Explicit choke group; pads without one choke within their column.
    choke_group: Option<u8>,

    /// Seconds a one-shot sounds for.
    duration: Option<f64>,

    /// Loop region in seconds, used by loop-mode pads.
    loop_start: Option<f64>,
    loop_end: Option<f64>,
}

fn default_note() -> u8 {
    60
}

impl PadDefinition {
    pub fn pad(&self) -> u8 {
        self.pad
    }

    /// Validates the definition and resolves it into a pad mapping.
    pub fn to_mapping(&self) -> Result<(PadId, PadMapping), ConfigError> {
        if usize::from(self.pad) >= NUM_PADS {
            return Err(ConfigError::PadOutOfRange {
                pad: self.pad,
                max: NUM_PADS - 1,
            });
        }

        let instrument = match self.pad_type {
            PadType::Sample => InstrumentKind::Sample {
                file: self
                    .file
                    .clone()
                    .ok_or(ConfigError::MissingSampleFile(self.pad))?,
            },
            PadType::Synth => InstrumentKind::Synth {
                preset: self.preset.clone(),
            },
            PadType::Drum => InstrumentKind::Drum {
                kit: self.kit.clone(),
            },
        };

        let loop_points = match (self.loop_start, self.loop_end) {
            (None, None) => None,
            (start, Some(end)) => {
                let start = start.unwrap_or(0.0);
                if !(start >= 0.0 && end > start) {
                    return Err(ConfigError::InvalidLoopPoints {
                        pad: self.pad,
                        start,
                        end,
                    });
                }
                Some(LoopPoints { start, end })
            }
            (Some(start), None) => {
                return Err(ConfigError::InvalidLoopPoints {
                    pad: self.pad,
                    start,
                    end: f64::NAN,
                })
            }
        };

        let mapping = PadMapping {
            instrument,
            note: self.note,
            mode: self.mode,
            choke_group: self.choke_group,
            duration: self.duration,
            loop_points,
        };
        Ok((PadId(self.pad), mapping))
    }
}
