//! [`plc_core::TimeSource`] implementations: a real monotonic clock for
//! `plc-sim`, and a deterministic stepped clock for tests — the `plc-io`
//! analogue of `ull65`'s `TestingBus`.

use plc_core::TimeSource;
use std::time::Instant;

/// Wraps [`std::time::Instant`] as the scheduler's monotonic microsecond
/// clock.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        SystemClock { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now_us(&mut self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }
}

/// A clock that advances by a fixed step every call, for deterministic
/// debounce and scan-duration tests.
pub struct SteppedClock {
    now_us: u64,
    step_us: u64,
}

impl SteppedClock {
    #[must_use]
    pub fn new(step_us: u64) -> Self {
        SteppedClock { now_us: 0, step_us }
    }
}

impl TimeSource for SteppedClock {
    fn now_us(&mut self) -> u64 {
        let now = self.now_us;
        self.now_us += self.step_us;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepped_clock_advances_by_a_fixed_amount_each_call() {
        let mut clock = SteppedClock::new(1_000);
        assert_eq!(clock.now_us(), 0);
        assert_eq!(clock.now_us(), 1_000);
        assert_eq!(clock.now_us(), 2_000);
    }

    #[test]
    fn system_clock_is_monotonic_non_decreasing() {
        let mut clock = SystemClock::new();
        let a = clock.now_us();
        let b = clock.now_us();
        assert!(b >= a);
    }
}
