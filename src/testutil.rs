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
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::voices::Instrument;
use crate::PadId;

/// A call made against the mock instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Trigger {
        pad: PadId,
        note: u8,
        offset: f64,
        duration: Option<f64>,
        time: f64,
    },
    Start {
        pad: PadId,
        note: u8,
    },
    Stop {
        pad: PadId,
        note: u8,
    },
}

impl Call {
    pub fn pad(&self) -> PadId {
        match self {
            Call::Trigger { pad, .. } | Call::Start { pad, .. } | Call::Stop { pad, .. } => *pad,
        }
    }
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    playing: HashSet<PadId>,
}

/// Records every instrument call. Clones share the same recording so a test
/// can keep one clone while the engine owns another.
#[derive(Clone, Default)]
pub struct MockInstrument {
    inner: Arc<Mutex<Inner>>,
}

impl MockInstrument {
    pub fn new() -> MockInstrument {
        MockInstrument::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    /// Overrides whether a pad reports as playing (used to keep one-shots alive).
    pub fn set_playing(&self, pad: PadId, playing: bool) {
        let mut inner = self.inner.lock();
        if playing {
            inner.playing.insert(pad);
        } else {
            inner.playing.remove(&pad);
        }
    }

    /// Number of trigger calls for the pad.
    pub fn triggers_for(&self, pad: PadId) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Trigger { pad: p, .. } if *p == pad))
            .count()
    }

    /// Number of times the pad was made to sound, by trigger or note start.
    pub fn sounded(&self, pad: PadId) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| !matches!(c, Call::Stop { .. }) && c.pad() == pad)
            .count()
    }

    /// Number of stop calls for the pad.
    pub fn stops_for(&self, pad: PadId) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Stop { pad: p, .. } if *p == pad))
            .count()
    }

    /// Trigger offsets and durations for the pad, in call order.
    pub fn trigger_regions(&self, pad: PadId) -> Vec<(f64, Option<f64>)> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Trigger {
                    pad: p,
                    offset,
                    duration,
                    ..
                } if *p == pad => Some((*offset, *duration)),
                _ => None,
            })
            .collect()
    }

    /// Trigger times (seconds) for the pad, in call order.
    pub fn trigger_times(&self, pad: PadId) -> Vec<f64> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Trigger { pad: p, time, .. } if *p == pad => Some(*time),
                _ => None,
            })
            .collect()
    }
}

impl Instrument for MockInstrument {
    fn trigger(&mut self, pad: PadId, note: u8, offset: f64, duration: Option<f64>, time: f64) {
        self.inner.lock().calls.push(Call::Trigger {
            pad,
            note,
            offset,
            duration,
            time,
        });
    }

    fn start_note(&mut self, pad: PadId, note: u8) {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Start { pad, note });
        inner.playing.insert(pad);
    }

    fn stop_note(&mut self, pad: PadId, note: u8) {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Stop { pad, note });
        inner.playing.remove(&pad);
    }

    fn is_playing(&self, pad: PadId) -> bool {
        self.inner.lock().playing.contains(&pad)
    }
}
