//! Reference run supervision.
//!
//! Covers have no position sensor, so the estimate drifts with every
//! partial move. A reference run drives the cover closed for the full
//! closing time plus a configurable overtravel, guaranteeing the cover sits
//! against its closed end stop. On completion the estimate is set to
//! exactly closed.
//!
//! ## Lifecycle
//!
//! 1. Engine stops any motion in progress, then calls `start()`
//! 2. The returned duration arms the completion timer, relay closes
//! 3. Timer fire → `complete()` → position = 0.0
//! 4. Any interrupting command → `abort()`; the estimate stays as integrated

use std::time::Duration;

// ─── Reference Phases ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePhase {
    /// No reference run has been requested.
    #[default]
    Idle,
    /// Driving into the closed end stop.
    Driving,
    /// Last run finished; position was reset to closed.
    Complete,
    /// Last run was interrupted before its deadline.
    Aborted,
}

// ─── Reference Supervisor ───────────────────────────────────────────

/// Per-cover reference run supervisor.
#[derive(Debug, Clone)]
pub struct ReferenceSupervisor {
    phase: ReferencePhase,
    overtravel: Duration,
    completed: u64,
    aborted: u64,
}

impl ReferenceSupervisor {
    pub fn new(overtravel: Duration) -> Self {
        Self {
            phase: ReferencePhase::Idle,
            overtravel,
            completed: 0,
            aborted: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> ReferencePhase {
        self.phase
    }

    /// Whether a reference run is driving the relay.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == ReferencePhase::Driving
    }

    #[inline]
    pub fn overtravel(&self) -> Duration {
        self.overtravel
    }

    /// Number of runs that reached their deadline.
    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Number of runs interrupted by another command.
    #[inline]
    pub fn aborted(&self) -> u64 {
        self.aborted
    }

    /// Begin a run. Returns the total close duration.
    pub fn start(&mut self, closing_time: Duration) -> Duration {
        self.phase = ReferencePhase::Driving;
        closing_time.saturating_add(self.overtravel)
    }

    /// Deadline reached. Returns `true` if a run was active.
    pub fn complete(&mut self) -> bool {
        if self.is_active() {
            self.phase = ReferencePhase::Complete;
            self.completed += 1;
            true
        } else {
            false
        }
    }

    /// Interrupted. No-op when no run is active.
    pub fn abort(&mut self) {
        if self.is_active() {
            self.phase = ReferencePhase::Aborted;
            self.aborted += 1;
        }
    }
}
