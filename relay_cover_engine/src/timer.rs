//! Single-slot completion timer.
//!
//! A cover has at most one pending completion deadline. Arming the slot
//! replaces any previous deadline; every arm gets a fresh id so a fire
//! for a superseded or cancelled deadline can be recognized and dropped.

use std::time::Instant;
use tracing::trace;

/// Identifies one armed deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    id: u64,
    deadline: Instant,
}

impl TimerHandle {
    #[inline]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// Holds zero or one pending deadline.
#[derive(Debug, Default)]
pub struct TimerSlot {
    next_id: u64,
    armed: Option<TimerHandle>,
}

impl TimerSlot {
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            armed: None,
        }
    }

    /// Arm a new deadline, replacing (cancelling) any pending one.
    pub fn arm(&mut self, deadline: Instant) -> TimerHandle {
        if let Some(old) = self.armed.take() {
            trace!(id = old.id, "timer superseded");
        }
        self.next_id = self.next_id.wrapping_add(1);
        let handle = TimerHandle {
            id: self.next_id,
            deadline,
        };
        self.armed = Some(handle);
        handle
    }

    /// Cancel the pending deadline. Returns it if one was armed.
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.armed.take()
    }

    #[inline]
    pub fn armed(&self) -> Option<TimerHandle> {
        self.armed
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Pending handle whose deadline has passed at `now`.
    #[inline]
    pub fn due(&self, now: Instant) -> Option<TimerHandle> {
        self.armed.filter(|h| h.deadline <= now)
    }

    /// Consume a fire. Returns `false` when `handle` is not the armed one
    /// (cancelled or superseded), in which case nothing changes.
    pub fn take(&mut self, handle: TimerHandle) -> bool {
        if self.armed == Some(handle) {
            self.armed = None;
            true
        } else {
            false
        }
    }
}
