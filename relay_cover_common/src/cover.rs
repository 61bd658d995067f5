//! Cover domain types shared by the engine and the host bridge.
//!
//! Positions are fractions in `[0.0, 1.0]` (0 = closed, 1 = open) inside the
//! workspace and percentages `0..=100` at the host boundary.
//! Enums use `#[repr(u8)]` with `from_u8` for compact state snapshots.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{PERCENT_MAX, POSITION_CLOSED, POSITION_EPSILON, POSITION_OPEN};

// ─── Errors ─────────────────────────────────────────────────────────

/// Command-level errors. State is never mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoverError {
    /// Position argument outside `[0, 1]` (or `0..=100` at the host boundary).
    #[error("invalid position {value}: expected 0..=1 (0..=100 %)")]
    InvalidPosition { value: f64 },

    /// Command addressed to a cover that is not configured.
    #[error("unknown cover '{0}'")]
    UnknownCover(String),

    /// Host command could not be understood.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

// ─── Position ───────────────────────────────────────────────────────

/// Estimated cover position, always within `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Position(f64);

impl Position {
    pub const CLOSED: Self = Self(POSITION_CLOSED);
    pub const OPEN: Self = Self(POSITION_OPEN);

    /// Validate a fractional position.
    ///
    /// # Errors
    /// `CoverError::InvalidPosition` for values outside `[0, 1]` or NaN.
    pub fn new(value: f64) -> Result<Self, CoverError> {
        if (POSITION_CLOSED..=POSITION_OPEN).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoverError::InvalidPosition { value })
        }
    }

    /// Clamp any finite value into range. NaN maps to closed.
    #[inline]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self::CLOSED
        } else {
            Self(value.clamp(POSITION_CLOSED, POSITION_OPEN))
        }
    }

    /// Convert a host percentage (`0..=100`).
    pub fn from_percent(percent: f64) -> Result<Self, CoverError> {
        if !(0.0..=f64::from(PERCENT_MAX)).contains(&percent) {
            return Err(CoverError::InvalidPosition {
                value: percent / f64::from(PERCENT_MAX),
            });
        }
        Ok(Self(percent / f64::from(PERCENT_MAX)))
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Rounded host percentage.
    #[inline]
    pub fn percent(self) -> u8 {
        (self.0 * f64::from(PERCENT_MAX)).round() as u8
    }

    #[inline]
    pub fn is_closed(self) -> bool {
        self.0 <= POSITION_CLOSED + POSITION_EPSILON
    }

    #[inline]
    pub fn is_open(self) -> bool {
        self.0 >= POSITION_OPEN - POSITION_EPSILON
    }

    /// Equality within `POSITION_EPSILON`.
    #[inline]
    pub fn approx_eq(self, other: Self) -> bool {
        (self.0 - other.0).abs() <= POSITION_EPSILON
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::CLOSED
    }
}

impl TryFrom<f64> for Position {
    type Error = CoverError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Position> for f64 {
    fn from(position: Position) -> Self {
        position.0
    }
}

// ─── Motion ─────────────────────────────────────────────────────────

/// Physical relay state of a cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Motion {
    /// Relay off. Initial state.
    #[default]
    Idle = 0,
    /// Open relay energized.
    Opening = 1,
    /// Close relay energized.
    Closing = 2,
}

impl Motion {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Opening),
            2 => Some(Self::Closing),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_moving(self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Travel direction sign (+1 opening, -1 closing, 0 idle).
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Idle => 0.0,
            Self::Opening => 1.0,
            Self::Closing => -1.0,
        }
    }

    /// Relay command that starts this motion (`Stop` for idle).
    #[inline]
    pub const fn relay_command(self) -> RelayCommand {
        match self {
            Self::Idle => RelayCommand::Stop,
            Self::Opening => RelayCommand::Open,
            Self::Closing => RelayCommand::Close,
        }
    }
}

// ─── Relay Command ──────────────────────────────────────────────────

/// Discrete command understood by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayCommand {
    Open,
    Close,
    Stop,
}

impl RelayCommand {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
        }
    }
}

// ─── Host-Facing State ──────────────────────────────────────────────

/// Cover state as shown by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverState {
    Open,
    Closed,
    Opening,
    Closing,
    /// Idle somewhere between the ends.
    Stopped,
}

impl CoverState {
    /// Derive the host state from motion and the (live) position.
    pub fn from_motion(motion: Motion, position: Position) -> Self {
        match motion {
            Motion::Opening => Self::Opening,
            Motion::Closing => Self::Closing,
            Motion::Idle if position.is_closed() => Self::Closed,
            Motion::Idle if position.is_open() => Self::Open,
            Motion::Idle => Self::Stopped,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Stopped => "stopped",
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
