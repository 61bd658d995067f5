//! Relay motion state transitions.
//!
//! Per-cover relay lifecycle: Idle → Opening/Closing → Idle.
//!
//! A direct Opening ↔ Closing transition is rejected: a reversal must pass
//! through Idle so that the stop command reaches the relay before the
//! opposite direction is energized. Repeating the current direction is
//! accepted and models a retarget while the relay stays on.

use relay_cover_common::cover::Motion;

/// Events that drive the motion state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    /// Energize the open relay.
    StartOpening,
    /// Energize the close relay.
    StartClosing,
    /// Explicit stop (user, reversal, calibration, shutdown).
    Stop,
    /// Completion timer fired.
    TargetReached,
}

/// Result of a transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionTransition {
    /// State changed (or was confirmed).
    Ok(Motion),
    /// Transition rejected.
    Rejected(&'static str),
}

/// Per-cover motion state machine.
#[derive(Debug, Clone, Default)]
pub struct MotionStateMachine {
    state: Motion,
}

impl MotionStateMachine {
    pub const fn new() -> Self {
        Self {
            state: Motion::Idle,
        }
    }

    #[inline]
    pub const fn state(&self) -> Motion {
        self.state
    }

    #[inline]
    pub const fn is_moving(&self) -> bool {
        self.state.is_moving()
    }

    /// Handle a motion event.
    pub fn handle_event(&mut self, event: MotionEvent) -> MotionTransition {
        use Motion as S;
        use MotionEvent as E;

        let next = match (self.state, event) {
            // Idle → moving
            (S::Idle, E::StartOpening) => S::Opening,
            (S::Idle, E::StartClosing) => S::Closing,

            // Retarget in the same direction
            (S::Opening, E::StartOpening) => S::Opening,
            (S::Closing, E::StartClosing) => S::Closing,

            // Reversal must stop first
            (S::Opening, E::StartClosing) | (S::Closing, E::StartOpening) => {
                return MotionTransition::Rejected("reversal requires stop");
            }

            // Moving → Idle
            (S::Opening | S::Closing, E::Stop | E::TargetReached) => S::Idle,

            (S::Idle, E::Stop) => return MotionTransition::Rejected("already idle"),
            (S::Idle, E::TargetReached) => {
                return MotionTransition::Rejected("no motion in progress");
            }
        };

        self.state = next;
        MotionTransition::Ok(next)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
