//! Time source for the cover engine.
//!
//! Every estimate and every timer deadline is computed from a single
//! [`Clock`]. Production code uses [`MonotonicClock`]; tests drive a
//! [`ManualClock`] forward explicitly so that motion sequences are fully
//! deterministic.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Current instant. Must never go backwards.
    fn now(&self) -> Instant;
}

/// Wall-clock monotonic time (`Instant::now()`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Start at the current real instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move time forward by `step`.
    pub fn advance(&self, step: Duration) {
        *self.now.lock() += step;
    }

    /// Jump to `instant`. Earlier instants are ignored.
    pub fn advance_to(&self, instant: Instant) {
        let mut now = self.now.lock();
        if instant > *now {
            *now = instant;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
