//! Injectable time source for cache age computation.
//!
//! Both caches compute entry age against a single [`Clock`] so tests can
//! drive TTL expiry deterministically instead of sleeping. Production code
//! uses [`SystemClock`]; tests use [`ManualClock`] and `advance()`.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time source.
///
/// Implementations must be monotonic — `now()` never moves backwards.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Real wall-clock-driven monotonic time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually-advanced clock for tests.
///
/// Starts at construction time and only moves when [`advance`](Self::advance)
/// is called.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().expect("clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn manual_clock_only_moves_on_advance() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);

        clock.advance(Duration::from_secs(60));
        assert_eq!(clock.now(), t0 + Duration::from_secs(60));
    }
}
