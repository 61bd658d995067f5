//! Host entity adapter.
//!
//! Translates host-platform commands (percentages, command words) into
//! engine commands and engine status into the host's cover representation.
//! No control logic lives here.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use relay_cover_common::config::CoverConfig;
use relay_cover_common::cover::{CoverError, CoverState, Position};
use serde::Serialize;

use crate::command::CoverCommand;
use crate::engine::CoverStatus;

bitflags! {
    /// Cover features advertised to the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CoverFeatures: u8 {
        const OPEN          = 0x01;
        const CLOSE         = 0x02;
        const SET_POSITION  = 0x04;
        const STOP          = 0x08;
    }
}

/// Every relay cover supports the same feature set; tilt is never offered.
pub const SUPPORTED_FEATURES: CoverFeatures = CoverFeatures::OPEN
    .union(CoverFeatures::CLOSE)
    .union(CoverFeatures::SET_POSITION)
    .union(CoverFeatures::STOP);

// ─── Host Commands ──────────────────────────────────────────────────

/// Command as issued by the host. Positions are percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    Open,
    Close,
    Stop,
    SetPosition(f64),
    Calibrate(f64),
    Reference,
}

impl HostCommand {
    /// Convert to an engine command.
    ///
    /// # Errors
    /// `CoverError::InvalidPosition` for percentages outside `0..=100`.
    pub fn to_cover_command(self) -> Result<CoverCommand, CoverError> {
        Ok(match self {
            Self::Open => CoverCommand::Open,
            Self::Close => CoverCommand::Close,
            Self::Stop => CoverCommand::Stop,
            Self::SetPosition(pct) => CoverCommand::SetPosition(Position::from_percent(pct)?.value()),
            Self::Calibrate(pct) => CoverCommand::Calibrate(Position::from_percent(pct)?.value()),
            Self::Reference => CoverCommand::Reference,
        })
    }
}

impl FromStr for HostCommand {
    type Err = CoverError;

    /// Parse `open`, `close`, `stop`, `reference`, `set_position <pct>` or
    /// `calibrate <pct>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let word = parts
            .next()
            .ok_or_else(|| CoverError::InvalidCommand("empty command".to_string()))?;
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(CoverError::InvalidCommand(format!("trailing input in '{s}'")));
        }

        let percent = |arg: Option<&str>| -> Result<f64, CoverError> {
            let raw = arg.ok_or_else(|| {
                CoverError::InvalidCommand(format!("'{word}' requires a percentage"))
            })?;
            raw.parse::<f64>()
                .map_err(|_| CoverError::InvalidCommand(format!("'{raw}' is not a number")))
        };
        let no_arg = |cmd: HostCommand| match arg {
            None => Ok(cmd),
            Some(extra) => Err(CoverError::InvalidCommand(format!(
                "'{word}' takes no argument, got '{extra}'"
            ))),
        };

        match word.to_ascii_lowercase().as_str() {
            "open" => no_arg(Self::Open),
            "close" => no_arg(Self::Close),
            "stop" => no_arg(Self::Stop),
            "reference" => no_arg(Self::Reference),
            "set_position" => Ok(Self::SetPosition(percent(arg)?)),
            "calibrate" => Ok(Self::Calibrate(percent(arg)?)),
            other => Err(CoverError::InvalidCommand(format!("unknown command '{other}'"))),
        }
    }
}

// ─── Entity State ───────────────────────────────────────────────────

/// Host representation of one cover's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityState {
    pub state: CoverState,
    /// Current position, percent.
    pub position: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u8>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub referencing: bool,
}

impl EntityState {
    pub fn from_status(status: &CoverStatus) -> Self {
        Self {
            state: status.state(),
            position: status.position.percent(),
            target: status.target.map(Position::percent),
            referencing: status.referencing,
        }
    }

    pub fn is_opening(&self) -> bool {
        self.state == CoverState::Opening
    }

    pub fn is_closing(&self) -> bool {
        self.state == CoverState::Closing
    }

    pub fn is_closed(&self) -> bool {
        self.state == CoverState::Closed
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}%", self.state.as_str(), self.position)?;
        if let Some(target) = self.target {
            write!(f, " -> {target}%")?;
        }
        if self.referencing {
            f.write_str(" (referencing)")?;
        }
        Ok(())
    }
}

/// Static entity description registered with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDescriptor {
    pub unique_id: String,
    pub name: String,
    pub supported_features: u8,
}

impl EntityDescriptor {
    pub fn from_config(config: &CoverConfig) -> Self {
        Self {
            unique_id: config.unique_id.clone(),
            name: config.name.clone(),
            supported_features: SUPPORTED_FEATURES.bits(),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use relay_cover_common::cover::Motion;

    #[test]
    fn parse_commands() {
        assert_eq!("open".parse::<HostCommand>(), Ok(HostCommand::Open));
        assert_eq!("  STOP ".parse::<HostCommand>(), Ok(HostCommand::Stop));
        assert_eq!("reference".parse::<HostCommand>(), Ok(HostCommand::Reference));
        assert_eq!(
            "set_position 40".parse::<HostCommand>(),
            Ok(HostCommand::SetPosition(40.0))
        );
        assert_eq!(
            "calibrate 12.5".parse::<HostCommand>(),
            Ok(HostCommand::Calibrate(12.5))
        );
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "tilt", "open now", "set_position", "calibrate abc", "stop 1 2"] {
            assert!(
                matches!(bad.parse::<HostCommand>(), Err(CoverError::InvalidCommand(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn percent_mapped_to_fraction() {
        assert_eq!(
            HostCommand::SetPosition(30.0).to_cover_command(),
            Ok(CoverCommand::SetPosition(0.3))
        );
        assert_eq!(
            HostCommand::Calibrate(100.0).to_cover_command(),
            Ok(CoverCommand::Calibrate(1.0))
        );
        assert!(matches!(
            HostCommand::SetPosition(150.0).to_cover_command(),
            Err(CoverError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn entity_state_json() {
        let status = CoverStatus {
            position: Position::clamped(0.42),
            motion: Motion::Opening,
            target: Some(Position::clamped(0.8)),
            referencing: false,
        };
        let state = EntityState::from_status(&status);
        assert!(state.is_opening());
        assert_eq!(
            serde_json::to_string(&state).unwrap(),
            r#"{"state":"opening","position":42,"target":80}"#
        );
        assert_eq!(state.to_string(), "opening 42% -> 80%");

        let idle = EntityState::from_status(&CoverStatus {
            position: Position::CLOSED,
            motion: Motion::Idle,
            target: None,
            referencing: false,
        });
        assert!(idle.is_closed());
        assert_eq!(
            serde_json::to_string(&idle).unwrap(),
            r#"{"state":"closed","position":0}"#
        );
    }

    #[test]
    fn features_exclude_tilt() {
        assert_eq!(SUPPORTED_FEATURES.bits(), 0x0F);
        assert!(SUPPORTED_FEATURES.contains(CoverFeatures::SET_POSITION));
    }
}
