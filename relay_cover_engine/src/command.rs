//! Command processing root.
//!
//! Cover commands as accepted by the engine, and reference-run supervision.

pub mod reference;

use relay_cover_common::cover::CoverError;

use crate::clock::Clock;
use crate::engine::CoverEngine;

/// One engine-level command. Positions are fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoverCommand {
    Open,
    Close,
    Stop,
    SetPosition(f64),
    Calibrate(f64),
    Reference,
}

impl CoverCommand {
    /// Whether the command can energize a relay.
    #[inline]
    pub const fn is_motion_command(&self) -> bool {
        matches!(
            self,
            Self::Open | Self::Close | Self::SetPosition(_) | Self::Reference
        )
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
            Self::SetPosition(_) => "set_position",
            Self::Calibrate(_) => "calibrate",
            Self::Reference => "reference",
        }
    }

    /// Execute against `engine`.
    ///
    /// # Errors
    /// `CoverError::InvalidPosition` for out-of-range position arguments.
    /// The engine is left untouched in that case.
    pub fn apply<C: Clock>(self, engine: &mut CoverEngine<C>) -> Result<(), CoverError> {
        match self {
            Self::Open => engine.open(),
            Self::Close => engine.close(),
            Self::Stop => engine.stop(),
            Self::SetPosition(p) => return engine.set_position(p),
            Self::Calibrate(p) => return engine.calibrate(p),
            Self::Reference => engine.reference(),
        }
        Ok(())
    }
}
