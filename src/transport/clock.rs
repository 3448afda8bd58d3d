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
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::quantize::Quantization;
use super::scheduler::{ScheduleHandle, Scheduler};

/// Default transport resolution.
pub const DEFAULT_TICKS_PER_BEAT: u64 = 192;

/// Time signature (beats per bar / note value of one beat).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub beats: u32,
    pub unit: u32,
}

impl TimeSignature {
    pub fn new(beats: u32, unit: u32) -> Self {
        TimeSignature { beats, unit }
    }

    /// Length of one bar in ticks, where `ticks_per_beat` is per quarter note.
    pub fn ticks_per_bar(&self, ticks_per_beat: u64) -> u64 {
        ticks_per_beat * 4 * u64::from(self.beats) / u64::from(self.unit.max(1))
    }

    /// Length of one bar in seconds at a tempo given in quarter notes per
    /// minute. Agrees with `ticks_per_bar` for any tick resolution.
    pub fn seconds_per_bar(&self, bpm: f64) -> f64 {
        60.0 / bpm * 4.0 * f64::from(self.beats) / f64::from(self.unit.max(1))
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::new(4, 4)
    }
}

/// A snapshot of the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub tick: u64,
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub running: bool,
}

/// The single source of musical time. Owns the tick position, the tempo and
/// the queue of callbacks waiting for a tick to arrive.
pub struct TransportClock<A> {
    tick: u64,
    bpm: f64,
    time_signature: TimeSignature,
    ticks_per_beat: u64,
    running: bool,
    /// Fractional ticks carried between wall-clock advances.
    carry: f64,
    scheduler: Scheduler<A>,
}

impl<A> TransportClock<A> {
    pub fn new(ticks_per_beat: u64, bpm: f64, time_signature: TimeSignature) -> TransportClock<A> {
        TransportClock {
            tick: 0,
            bpm,
            time_signature,
            ticks_per_beat: ticks_per_beat.max(1),
            running: false,
            carry: 0.0,
            scheduler: Scheduler::new(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn ticks_per_beat(&self) -> u64 {
        self.ticks_per_beat
    }

    pub fn ticks_per_bar(&self) -> u64 {
        self.time_signature.ticks_per_bar(self.ticks_per_beat)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> TransportState {
        TransportState {
            tick: self.tick,
            bpm: self.bpm,
            time_signature: self.time_signature,
            running: self.running,
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            debug!(tick = self.tick, bpm = self.bpm, "Transport started");
            self.running = true;
            self.carry = 0.0;
        }
    }

    /// Stops the transport. The tick position is kept so that scheduled
    /// loops stay phase-locked when it resumes.
    pub fn stop(&mut self) {
        if self.running {
            debug!(tick = self.tick, "Transport stopped");
            self.running = false;
            self.carry = 0.0;
        }
    }

    /// Changes the tempo. Tick positions are unaffected; only the
    /// tick/seconds conversion changes.
    pub fn set_bpm(&mut self, bpm: f64) {
        if bpm.is_finite() && bpm > 0.0 {
            self.bpm = bpm;
        }
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Converts a tick position to seconds at the current tempo.
    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 * self.seconds_per_beat() / self.ticks_per_beat as f64
    }

    /// Converts seconds to the nearest whole tick count at the current tempo.
    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.ticks_per_beat as f64 / self.seconds_per_beat()).round() as u64
    }

    /// The tick of the next grid line strictly after the current tick, or the
    /// current tick if quantization is off.
    pub fn next_subdivision(&self, quantization: Quantization) -> u64 {
        quantization.next_line(self.tick, self.ticks_per_beat, self.time_signature)
    }

    /// Snaps the current tick to the nearest grid line.
    pub fn nearest_subdivision(&self, quantization: Quantization) -> u64 {
        quantization.snap_nearest(self.tick, self.ticks_per_beat, self.time_signature)
    }

    pub fn schedule(&mut self, tick: u64, action: A) -> ScheduleHandle {
        self.scheduler.schedule(tick, action)
    }

    pub fn cancel(&mut self, handle: ScheduleHandle) -> bool {
        self.scheduler.cancel(handle)
    }

    pub fn is_pending(&self, handle: ScheduleHandle) -> bool {
        self.scheduler.is_pending(handle)
    }

    pub fn pending_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Pops the next action due at or before `target`, moving the tick
    /// position to that action's tick so the callback observes its own time.
    /// Returns None once nothing more is due, leaving the tick at `target`.
    pub fn next_due(&mut self, target: u64) -> Option<(u64, A)> {
        if !self.running {
            return None;
        }
        match self.scheduler.pop_due(target) {
            Some((due, action)) => {
                self.tick = self.tick.max(due);
                Some((due, action))
            }
            None => {
                self.tick = self.tick.max(target);
                None
            }
        }
    }

    /// Converts elapsed wall-clock time into a target tick, carrying the
    /// fractional remainder forward.
    pub fn target_for_elapsed(&mut self, elapsed: Duration) -> u64 {
        if !self.running {
            return self.tick;
        }
        let ticks = elapsed.as_secs_f64() / self.seconds_per_beat() * self.ticks_per_beat as f64
            + self.carry;
        let whole = ticks.floor();
        self.carry = ticks - whole;
        self.tick + whole as u64
    }
}

impl<A> std::fmt::Debug for TransportClock<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportClock")
            .field("tick", &self.tick)
            .field("bpm", &self.bpm)
            .field("time_signature", &self.time_signature)
            .field("running", &self.running)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
