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
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, span, warn, Level};

use crate::engine::Engine;
use crate::playsync::CancelHandle;

/// Anything that moves forward with wall-clock time.
pub trait Clocked: Send {
    fn advance_by(&mut self, elapsed: Duration);
}

impl Clocked for Engine {
    fn advance_by(&mut self, elapsed: Duration) {
        Engine::advance_by(self, elapsed);
    }
}

/// Pumps wall-clock time into a shared engine from a dedicated thread.
pub struct ClockDriver {
    cancel_handle: CancelHandle,
    join: Option<JoinHandle<()>>,
}

impl ClockDriver {
    /// Starts the pump. The thread wakes every `resolution` and hands the
    /// time since its last wake to the target. A priority of 0-99 is applied
    /// on a best-effort basis.
    pub fn start<T>(
        target: Arc<Mutex<T>>,
        resolution: Duration,
        priority: Option<u8>,
    ) -> Result<ClockDriver, io::Error>
    where
        T: Clocked + 'static,
    {
        let cancel_handle = CancelHandle::new();
        let resolution = resolution.max(Duration::from_micros(100));

        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::Builder::new()
                .name("clock".to_string())
                .spawn(move || {
                    let span = span!(Level::INFO, "clock driver");
                    let _enter = span.enter();

                    if let Some(priority) = priority {
                        raise_priority(priority);
                    }
                    info!(resolution_us = resolution.as_micros() as u64, "Clock driver started");

                    let mut last_wake = Instant::now();
                    let mut deadline = last_wake;
                    loop {
                        if cancel_handle.is_cancelled() {
                            break;
                        }

                        let now = Instant::now();
                        target.lock().advance_by(now - last_wake);
                        last_wake = now;

                        deadline += resolution;
                        let now = Instant::now();
                        if deadline > now {
                            spin_sleep::sleep(deadline - now);
                        } else {
                            // Fell behind; don't try to catch up with a burst.
                            deadline = now;
                        }
                    }
                    info!("Clock driver stopped");
                })?
        };

        Ok(ClockDriver {
            cancel_handle,
            join: Some(join),
        })
    }

    /// Stops the pump and waits for its thread to exit.
    pub fn stop(&mut self) {
        self.cancel_handle.cancel();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("Clock driver thread panicked");
            }
        }
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn raise_priority(priority: u8) {
    match ThreadPriorityValue::try_from(priority.min(99)) {
        Ok(value) => {
            if let Err(e) = set_current_thread_priority(ThreadPriority::Crossplatform(value)) {
                warn!(priority, error = ?e, "Unable to raise clock thread priority");
            }
        }
        Err(e) => warn!(priority, error = %e, "Invalid clock thread priority"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Elapsed {
        total: Duration,
        wakes: usize,
    }

    impl Clocked for Elapsed {
        fn advance_by(&mut self, elapsed: Duration) {
            self.total += elapsed;
            self.wakes += 1;
        }
    }

    #[test]
    fn test_driver_pumps_until_stopped() {
        let target = Arc::new(Mutex::new(Elapsed::default()));
        let mut driver =
            ClockDriver::start(target.clone(), Duration::from_millis(1), None).unwrap();
        thread::sleep(Duration::from_millis(30));
        driver.stop();

        let (total, wakes) = {
            let elapsed = target.lock();
            (elapsed.total, elapsed.wakes)
        };
        assert!(wakes > 1);
        assert!(total > Duration::ZERO);

        // Nothing runs after stop.
        thread::sleep(Duration::from_millis(10));
        assert_eq!(wakes, target.lock().wakes);
    }
}
