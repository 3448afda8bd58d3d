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

//! Tick-stamped callback queue.
//!
//! Entries are ordered by tick, then by registration order for entries that
//! share a tick. Every entry gets a handle that can cancel it until it fires.

use std::collections::{BTreeMap, HashMap};

/// Identifies a scheduled entry so that it can be cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScheduleHandle(u64);

/// A sorted queue of actions keyed by the tick they should run at.
pub struct Scheduler<A> {
    /// Pending actions keyed by (tick, registration sequence).
    queue: BTreeMap<(u64, u64), A>,
    /// Reverse index so handles can be cancelled without a scan.
    ticks_by_handle: HashMap<ScheduleHandle, u64>,
    next_seq: u64,
}

impl<A> Scheduler<A> {
    pub fn new() -> Scheduler<A> {
        Scheduler {
            queue: BTreeMap::new(),
            ticks_by_handle: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Registers an action to run at the given tick.
    pub fn schedule(&mut self, tick: u64, action: A) -> ScheduleHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let handle = ScheduleHandle(seq);
        self.queue.insert((tick, seq), action);
        self.ticks_by_handle.insert(handle, tick);
        handle
    }

    /// Cancels a pending action. Returns false if it already fired or was
    /// already cancelled.
    pub fn cancel(&mut self, handle: ScheduleHandle) -> bool {
        match self.ticks_by_handle.remove(&handle) {
            Some(tick) => self.queue.remove(&(tick, handle.0)).is_some(),
            None => false,
        }
    }

    /// Returns true if the handle still refers to a pending action.
    pub fn is_pending(&self, handle: ScheduleHandle) -> bool {
        self.ticks_by_handle.contains_key(&handle)
    }

    /// Removes and returns the earliest action due at or before `tick`.
    pub fn pop_due(&mut self, tick: u64) -> Option<(u64, A)> {
        let (&(due, seq), _) = self.queue.first_key_value()?;
        if due > tick {
            return None;
        }
        let action = self.queue.remove(&(due, seq))?;
        self.ticks_by_handle.remove(&ScheduleHandle(seq));
        Some((due, action))
    }

    /// The tick of the earliest pending action.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(tick, _)| *tick)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl<A> std::fmt::Debug for Scheduler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.queue.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler<&'static str>, tick: u64) -> Vec<(u64, &'static str)> {
        let mut fired = Vec::new();
        while let Some(entry) = scheduler.pop_due(tick) {
            fired.push(entry);
        }
        fired
    }

    #[test]
    fn test_tick_order_then_registration_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(20, "c");
        scheduler.schedule(10, "a");
        scheduler.schedule(20, "d");
        scheduler.schedule(10, "b");

        assert_eq!(
            vec![(10, "a"), (10, "b"), (20, "c"), (20, "d")],
            drain(&mut scheduler, 100)
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_only_due_entries_fire() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(5, "early");
        scheduler.schedule(50, "late");

        assert_eq!(vec![(5, "early")], drain(&mut scheduler, 49));
        assert_eq!(Some(50), scheduler.next_due());
        assert_eq!(vec![(50, "late")], drain(&mut scheduler, 50));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = Scheduler::new();
        let keep = scheduler.schedule(10, "keep");
        let drop = scheduler.schedule(10, "drop");

        assert!(scheduler.is_pending(drop));
        assert!(scheduler.cancel(drop));
        assert!(!scheduler.is_pending(drop));
        // Cancelling twice is harmless.
        assert!(!scheduler.cancel(drop));

        assert_eq!(vec![(10, "keep")], drain(&mut scheduler, 10));
        // Fired entries can no longer be cancelled.
        assert!(!scheduler.cancel(keep));
    }
}
