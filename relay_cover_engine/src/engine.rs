//! Per-cover motion engine.
//!
//! The engine is the sole authority for a cover's estimated position and
//! relay activation. It integrates position linearly over elapsed time,
//! owns the single completion timer, and publishes exactly one relay
//! command per relay-state transition.
//!
//! ## Position bookkeeping
//!
//! `position` holds the estimate at the last relay-state transition (or
//! retarget). While moving, the live estimate is
//! `position ± elapsed / travel_time`, clamped to `[0, 1]` and never past
//! the active target. Every interruption folds the live estimate back into
//! `position` before anything else changes.
//!
//! ## Timeline
//!
//! All mutations run on one logical timeline: command calls and timer fires
//! never overlap. A command always cancels the pending timer before touching
//! state, so a fire delivered after a command (a stale handle) is ignored.

use std::time::{Duration, Instant};

use relay_cover_common::channel::{ChannelError, SharedChannel};
use relay_cover_common::config::CoverConfig;
use relay_cover_common::cover::{CoverError, CoverState, Motion, Position, RelayCommand};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::command::reference::ReferenceSupervisor;
use crate::state::motion::{MotionEvent, MotionStateMachine, MotionTransition};
use crate::timer::{TimerHandle, TimerSlot};

// ─── Status & Stats ─────────────────────────────────────────────────

/// Snapshot of one cover, with the live position estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverStatus {
    pub position: Position,
    pub motion: Motion,
    pub target: Option<Position>,
    pub referencing: bool,
}

impl CoverStatus {
    #[inline]
    pub fn state(&self) -> CoverState {
        CoverState::from_motion(self.motion, self.position)
    }
}

/// Result of delivering a timer fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Motion finalized, cover is idle.
    Settled,
    /// Handle was cancelled or superseded; nothing changed.
    Stale,
}

/// Relay delivery counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineStats {
    /// Relay commands accepted by the channel.
    pub relay_commands: u64,
    /// Relay commands the channel refused.
    pub delivery_failures: u64,
    pub last_delivery_error: Option<ChannelError>,
}

// ─── Cover Engine ───────────────────────────────────────────────────

pub struct CoverEngine<C: Clock> {
    config: CoverConfig,
    clock: C,
    channel: SharedChannel,
    position: Position,
    machine: MotionStateMachine,
    target: Option<Position>,
    motion_started_at: Option<Instant>,
    timer: TimerSlot,
    reference: ReferenceSupervisor,
    stats: EngineStats,
    /// Unreported state change pending.
    dirty: bool,
}

impl<C: Clock> CoverEngine<C> {
    /// Create an idle engine at the configured initial position.
    pub fn new(config: CoverConfig, clock: C, channel: SharedChannel) -> Self {
        let position = config.initial_position;
        let reference = ReferenceSupervisor::new(config.reference_overtravel);
        Self {
            config,
            clock,
            channel,
            position,
            machine: MotionStateMachine::new(),
            target: None,
            motion_started_at: None,
            timer: TimerSlot::new(),
            reference,
            stats: EngineStats::default(),
            dirty: true,
        }
    }

    #[inline]
    pub fn config(&self) -> &CoverConfig {
        &self.config
    }

    /// Host-facing object id (configuration key).
    #[inline]
    pub fn id(&self) -> &str {
        &self.config.object_id
    }

    /// Estimate at the last relay-state transition.
    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    pub fn motion(&self) -> Motion {
        self.machine.state()
    }

    #[inline]
    pub fn target(&self) -> Option<Position> {
        self.target
    }

    #[inline]
    pub fn motion_started_at(&self) -> Option<Instant> {
        self.motion_started_at
    }

    #[inline]
    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.timer.armed()
    }

    #[inline]
    pub fn is_referencing(&self) -> bool {
        self.reference.is_active()
    }

    #[inline]
    pub fn reference_supervisor(&self) -> &ReferenceSupervisor {
        &self.reference
    }

    #[inline]
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Live position estimate at `now`.
    pub fn estimate_at(&self, now: Instant) -> Position {
        let motion = self.machine.state();
        let Some(started) = self.motion_started_at else {
            return self.position;
        };
        if !motion.is_moving() {
            return self.position;
        }

        let travel = self.config.travel_time(motion).as_secs_f64();
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let raw = self.position.value() + motion.sign() * elapsed / travel;
        let bounded = match (motion, self.target) {
            (Motion::Opening, Some(t)) => raw.min(t.value()),
            (Motion::Closing, Some(t)) => raw.max(t.value()),
            _ => raw,
        };
        Position::clamped(bounded)
    }

    /// Live position estimate now.
    #[inline]
    pub fn current_position(&self) -> Position {
        self.estimate_at(self.clock.now())
    }

    pub fn status(&self) -> CoverStatus {
        CoverStatus {
            position: self.current_position(),
            motion: self.machine.state(),
            target: self.target,
            referencing: self.reference.is_active(),
        }
    }

    /// Status if anything changed since the last call.
    pub fn take_update(&mut self) -> Option<CoverStatus> {
        if self.dirty {
            self.dirty = false;
            Some(self.status())
        } else {
            None
        }
    }

    /// Idle ⇔ no timer ⇔ no start time; target only while moving.
    pub fn is_consistent(&self) -> bool {
        let moving = self.machine.is_moving();
        moving == self.timer.is_armed()
            && moving == self.motion_started_at.is_some()
            && (moving || self.target.is_none())
            && !(self.reference.is_active() && !moving)
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Drive to the open end stop.
    pub fn open(&mut self) {
        self.move_to_end(Motion::Opening);
    }

    /// Drive to the closed end stop.
    pub fn close(&mut self) {
        self.move_to_end(Motion::Closing);
    }

    /// Stop any motion, freezing the integrated position. Idempotent.
    pub fn stop(&mut self) {
        if !self.machine.is_moving() {
            debug!(cover = %self.config.object_id, "stop ignored, already idle");
            return;
        }
        let now = self.clock.now();
        self.halt(now, "stop command");
    }

    /// Move to fractional position `value`.
    ///
    /// # Errors
    /// `CoverError::InvalidPosition` if `value` is outside `[0, 1]`.
    pub fn set_position(&mut self, value: f64) -> Result<(), CoverError> {
        let target = Position::new(value)?;
        let now = self.clock.now();
        let current = self.estimate_at(now);

        if target.approx_eq(current) {
            if self.machine.is_moving() {
                self.halt(now, "target is current position");
            } else {
                debug!(
                    cover = %self.config.object_id,
                    position = current.percent(),
                    "already at requested position"
                );
            }
            return Ok(());
        }

        let motion = if target > current {
            Motion::Opening
        } else {
            Motion::Closing
        };
        self.drive(motion, Some(target), now);
        Ok(())
    }

    /// Overwrite the estimate with an observed position.
    ///
    /// Motion in progress is resolved with stop semantics first, which
    /// publishes "stop". An idle calibration publishes nothing.
    ///
    /// # Errors
    /// `CoverError::InvalidPosition` if `value` is outside `[0, 1]`.
    pub fn calibrate(&mut self, value: f64) -> Result<(), CoverError> {
        let position = Position::new(value)?;
        if self.machine.is_moving() {
            let now = self.clock.now();
            self.halt(now, "calibration");
        }
        info!(
            cover = %self.config.object_id,
            from = self.position.percent(),
            to = position.percent(),
            "position calibrated"
        );
        self.position = position;
        self.dirty = true;
        Ok(())
    }

    /// Close for the full closing time plus overtravel, then zero the
    /// estimate.
    pub fn reference(&mut self) {
        if self.reference.is_active() {
            debug!(cover = %self.config.object_id, "reference run already active");
            return;
        }
        let now = self.clock.now();
        if self.machine.is_moving() {
            self.halt(now, "reference run");
        }
        let duration = self.reference.start(self.config.closing_time);
        info!(
            cover = %self.config.object_id,
            duration_ms = duration.as_millis() as u64,
            "reference run started"
        );
        self.begin(Motion::Closing, None, now, duration);
    }

    /// Restore a persisted estimate at startup. Ignored while moving.
    pub fn restore(&mut self, position: Position) {
        if self.machine.is_moving() {
            warn!(cover = %self.config.object_id, "restore ignored while moving");
            return;
        }
        self.position = position;
        self.dirty = true;
    }

    // ─── Timer ──────────────────────────────────────────────────────

    /// Fire the completion timer if its deadline has passed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<TimerOutcome> {
        let handle = self.timer.due(now)?;
        Some(self.on_timer(handle))
    }

    /// Deliver a timer fire for `handle`.
    pub fn on_timer(&mut self, handle: TimerHandle) -> TimerOutcome {
        if !self.timer.take(handle) {
            debug!(
                cover = %self.config.object_id,
                timer = handle.id(),
                "stale timer fire ignored"
            );
            return TimerOutcome::Stale;
        }

        let motion = self.machine.state();
        let referencing = self.reference.complete();
        let intermediate = self.target.is_some();
        let goal = if referencing {
            Position::CLOSED
        } else {
            self.target.unwrap_or_else(|| end_of_travel(motion))
        };

        self.transition(MotionEvent::TargetReached);
        self.position = goal;
        self.target = None;
        self.motion_started_at = None;
        if intermediate || self.config.stop_at_travel_end {
            self.send(RelayCommand::Stop);
        }
        info!(
            cover = %self.config.object_id,
            position = goal.percent(),
            referencing,
            "motion settled"
        );
        self.dirty = true;
        TimerOutcome::Settled
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn move_to_end(&mut self, motion: Motion) {
        if self.machine.state() == motion && self.target.is_none() && !self.reference.is_active()
        {
            debug!(
                cover = %self.config.object_id,
                direction = motion.relay_command().as_str(),
                "already moving to end of travel"
            );
            return;
        }
        let now = self.clock.now();
        self.drive(motion, None, now);
    }

    /// Start (or retarget) motion toward `target`, or the end of travel.
    fn drive(&mut self, motion: Motion, target: Option<Position>, now: Instant) {
        let current = self.machine.state();
        if current.is_moving() && current != motion {
            self.halt(now, "reversal");
        } else if current == motion {
            if let Some(h) = self.timer.cancel() {
                debug!(cover = %self.config.object_id, timer = h.id(), "timer cancelled for retarget");
            }
            self.position = self.estimate_at(now);
            self.motion_started_at = Some(now);
            self.reference.abort();
        }

        let goal = target.unwrap_or_else(|| end_of_travel(motion));
        if self.position.approx_eq(goal) {
            if self.machine.is_moving() {
                self.halt(now, "target is current position");
            } else {
                debug!(
                    cover = %self.config.object_id,
                    position = self.position.percent(),
                    "already at end of travel"
                );
            }
            return;
        }

        let remaining = self.travel_duration(motion, goal);
        self.begin(motion, target, now, remaining);
    }

    /// Enter `motion` for `duration`. Publishes only when the relay was off.
    fn begin(&mut self, motion: Motion, target: Option<Position>, now: Instant, duration: Duration) {
        let was_moving = self.machine.is_moving();
        let event = match motion {
            Motion::Opening => MotionEvent::StartOpening,
            _ => MotionEvent::StartClosing,
        };
        if !self.transition(event) {
            self.reference.abort();
            return;
        }

        self.target = target;
        self.motion_started_at = Some(now);
        let handle = self.timer.arm(now + duration);
        debug!(
            cover = %self.config.object_id,
            timer = handle.id(),
            remaining_ms = duration.as_millis() as u64,
            "completion timer armed"
        );

        if !was_moving {
            self.send(motion.relay_command());
        }
        info!(
            cover = %self.config.object_id,
            direction = motion.relay_command().as_str(),
            from = self.position.percent(),
            target = ?target.map(Position::percent),
            retarget = was_moving,
            "motion started"
        );
        self.dirty = true;
    }

    /// Stop semantics: cancel timer, integrate, relay off, publish stop.
    fn halt(&mut self, now: Instant, reason: &'static str) {
        if let Some(h) = self.timer.cancel() {
            debug!(cover = %self.config.object_id, timer = h.id(), "completion timer cancelled");
        }
        self.position = self.estimate_at(now);
        self.transition(MotionEvent::Stop);
        self.target = None;
        self.motion_started_at = None;
        self.reference.abort();
        self.send(RelayCommand::Stop);
        info!(
            cover = %self.config.object_id,
            position = self.position.percent(),
            reason,
            "motion stopped"
        );
        self.dirty = true;
    }

    fn travel_duration(&self, motion: Motion, goal: Position) -> Duration {
        let fraction = (goal.value() - self.position.value()).abs();
        self.config.travel_time(motion).mul_f64(fraction)
    }

    fn transition(&mut self, event: MotionEvent) -> bool {
        match self.machine.handle_event(event) {
            MotionTransition::Ok(_) => true,
            MotionTransition::Rejected(reason) => {
                warn!(
                    cover = %self.config.object_id,
                    ?event,
                    reason,
                    "motion transition rejected"
                );
                false
            }
        }
    }

    /// Fire-and-forget publish. Failures are counted, never retried.
    fn send(&mut self, command: RelayCommand) {
        let relay = &self.config.relay;
        match self.channel.publish(&relay.topic, relay.payload(command)) {
            Ok(()) => self.stats.relay_commands += 1,
            Err(e) => {
                self.stats.delivery_failures += 1;
                warn!(
                    cover = %self.config.object_id,
                    command = command.as_str(),
                    error = %e,
                    "relay command not delivered"
                );
                self.stats.last_delivery_error = Some(e);
            }
        }
    }
}

#[inline]
fn end_of_travel(motion: Motion) -> Position {
    match motion {
        Motion::Opening => Position::OPEN,
        _ => Position::CLOSED,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
