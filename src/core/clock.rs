//! Monotonic time source for the engine.
//!
//! Background tasks read [`SystemClock`]; tests and simulations drive a
//! [`ManualClock`] so ticks can be replayed without wall-clock sleeps.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// A source of monotonic instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The process monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    current: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        let origin = Instant::now();
        Self {
            origin,
            current: Mutex::new(origin),
        }
    }

    /// The instant the clock was created at (t = 0).
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Advance the clock and return the new instant.
    pub fn advance(&self, by: Duration) -> Instant {
        let mut current = self.current.lock();
        *current += by;
        *current
    }

    /// Jump to `origin + offset`. Moving backwards is ignored.
    pub fn set_offset(&self, offset: Duration) -> Instant {
        let mut current = self.current.lock();
        let target = self.origin + offset;
        if target > *current {
            *current = target;
        }
        *current
    }

    /// Elapsed time since the origin.
    pub fn elapsed(&self) -> Duration {
        self.current.lock().saturating_duration_since(self.origin)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));
        assert_eq!(clock.elapsed(), Duration::from_millis(250));
    }

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let clock = ManualClock::new();
        clock.set_offset(Duration::from_secs(2));
        clock.set_offset(Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_secs(2));
    }
}
