//! Lightweight stage profiling.
//!
//! [`Timer`] accumulates wall-clock time spent in a named section of the pipeline across calls, so
//! that `log::trace!`-level diagnostics can report where time went without pulling in a full
//! profiling framework.

use std::time::{Duration, Instant};

/// Accumulates the time spent in a named section of code.
#[derive(Debug, Clone)]
pub struct Timer {
    name: &'static str,
    total: Duration,
    last: Duration,
    invocations: u32,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            total: Duration::ZERO,
            last: Duration::ZERO,
            invocations: 0,
        }
    }

    /// Runs `f`, recording how long it took.
    pub fn time<R>(&mut self, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.last = start.elapsed();
        self.total += self.last;
        self.invocations += 1;
        log::trace!("{}: {:?} (call #{})", self.name, self.last, self.invocations);
        result
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Duration of the most recent invocation.
    pub fn last(&self) -> Duration {
        self.last
    }

    /// Total duration accumulated across all invocations.
    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn invocations(&self) -> u32 {
        self.invocations
    }

    /// Average duration per invocation, or zero if `time` was never called.
    pub fn average(&self) -> Duration {
        if self.invocations == 0 {
            Duration::ZERO
        } else {
            self.total / self.invocations
        }
    }
}

impl std::fmt::Display for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: last={:?} avg={:?} ({} calls)",
            self.name,
            self.last,
            self.average(),
            self.invocations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn accumulates_time() {
        let mut t = Timer::new("test");
        t.time(|| sleep(Duration::from_millis(1)));
        t.time(|| sleep(Duration::from_millis(1)));
        assert_eq!(t.invocations(), 2);
        assert!(t.total() >= Duration::from_millis(2));
        assert!(t.average() <= t.total());
    }
}
