//! Wall-clock timing for a run.

use std::time::{Duration, Instant};

/// Monotonic stopwatch started at construction.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Runs `f` and returns its value with how long it took.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let timer = Timer::start();
    let value = f();
    (value, timer.elapsed())
}
