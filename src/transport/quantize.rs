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
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::clock::TimeSignature;

/// Launch quantization: the grid that recording starts and deferred
/// transitions snap to.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Quantization {
    #[serde(rename = "none")]
    None,
    #[default]
    #[serde(rename = "1bar")]
    Bar,
    #[serde(rename = "1/2")]
    Half,
    #[serde(rename = "1/4")]
    Quarter,
    #[serde(rename = "1/8")]
    Eighth,
    #[serde(rename = "1/16")]
    Sixteenth,
}

impl Quantization {
    /// The grid interval in ticks, or None when quantization is off.
    /// Note values are relative to a quarter-note beat of `ticks_per_beat`.
    pub fn interval_ticks(self, ticks_per_beat: u64, signature: TimeSignature) -> Option<u64> {
        let interval = match self {
            Quantization::None => return None,
            Quantization::Bar => signature.ticks_per_bar(ticks_per_beat),
            Quantization::Half => ticks_per_beat * 2,
            Quantization::Quarter => ticks_per_beat,
            Quantization::Eighth => ticks_per_beat / 2,
            Quantization::Sixteenth => ticks_per_beat / 4,
        };
        Some(interval.max(1))
    }

    /// Snaps a tick to the nearest grid line. Halfway points round forward.
    pub fn snap_nearest(self, tick: u64, ticks_per_beat: u64, signature: TimeSignature) -> u64 {
        match self.interval_ticks(ticks_per_beat, signature) {
            None => tick,
            Some(interval) => ((tick + interval / 2) / interval) * interval,
        }
    }

    /// Returns the next grid line strictly after the tick, or the tick itself
    /// when quantization is off.
    pub fn next_line(self, tick: u64, ticks_per_beat: u64, signature: TimeSignature) -> u64 {
        match self.interval_ticks(ticks_per_beat, signature) {
            None => tick,
            Some(interval) => (tick / interval + 1) * interval,
        }
    }

    pub fn is_none(self) -> bool {
        self == Quantization::None
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantization::None => "none",
            Quantization::Bar => "1bar",
            Quantization::Half => "1/2",
            Quantization::Quarter => "1/4",
            Quantization::Eighth => "1/8",
            Quantization::Sixteenth => "1/16",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Quantization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(Quantization::None),
            "1bar" | "bar" | "1m" => Ok(Quantization::Bar),
            "1/2" | "2n" => Ok(Quantization::Half),
            "1/4" | "4n" => Ok(Quantization::Quarter),
            "1/8" | "8n" => Ok(Quantization::Eighth),
            "1/16" | "16n" => Ok(Quantization::Sixteenth),
            other => Err(format!("unknown quantization '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PPQ: u64 = 192;

    fn four_four() -> TimeSignature {
        TimeSignature::new(4, 4)
    }

    #[test]
    fn test_interval_ticks() {
        let sig = four_four();
        assert_eq!(None, Quantization::None.interval_ticks(PPQ, sig));
        assert_eq!(Some(768), Quantization::Bar.interval_ticks(PPQ, sig));
        assert_eq!(Some(384), Quantization::Half.interval_ticks(PPQ, sig));
        assert_eq!(Some(192), Quantization::Quarter.interval_ticks(PPQ, sig));
        assert_eq!(Some(96), Quantization::Eighth.interval_ticks(PPQ, sig));
        assert_eq!(Some(48), Quantization::Sixteenth.interval_ticks(PPQ, sig));

        // A bar of 3/4 is three quarter notes.
        assert_eq!(
            Some(576),
            Quantization::Bar.interval_ticks(PPQ, TimeSignature::new(3, 4))
        );
    }

    #[test]
    fn test_snap_nearest() {
        let sig = four_four();
        assert_eq!(0, Quantization::Bar.snap_nearest(100, PPQ, sig));
        assert_eq!(768, Quantization::Bar.snap_nearest(700, PPQ, sig));
        assert_eq!(768, Quantization::Bar.snap_nearest(384, PPQ, sig));
        assert_eq!(192, Quantization::Quarter.snap_nearest(200, PPQ, sig));
        assert_eq!(201, Quantization::None.snap_nearest(201, PPQ, sig));
    }

    #[test]
    fn test_next_line_is_strictly_after() {
        let sig = four_four();
        assert_eq!(768, Quantization::Bar.next_line(0, PPQ, sig));
        assert_eq!(768, Quantization::Bar.next_line(767, PPQ, sig));
        assert_eq!(1536, Quantization::Bar.next_line(768, PPQ, sig));
        assert_eq!(48, Quantization::Sixteenth.next_line(47, PPQ, sig));
        assert_eq!(333, Quantization::None.next_line(333, PPQ, sig));
    }

    #[test]
    fn test_parse_and_display() {
        for q in [
            Quantization::None,
            Quantization::Bar,
            Quantization::Half,
            Quantization::Quarter,
            Quantization::Eighth,
            Quantization::Sixteenth,
        ] {
            assert_eq!(Ok(q), q.to_string().parse::<Quantization>());
        }
        assert_eq!(Ok(Quantization::Quarter), "4n".parse::<Quantization>());
        assert!("1/3".parse::<Quantization>().is_err());
    }
}
