//! # Relay Cover Engine
//!
//! Open-loop position estimation and motion control for covers driven by
//! on/off relays with no position feedback.
//!
//! ## Levels
//!
//! 1. **MotionStateMachine**: per-cover relay state (Idle / Opening / Closing)
//! 2. **CoverEngine**: position integration, completion timer, relay commands
//! 3. **CoverRuntime**: all configured covers on one timeline
//! 4. **Entity adapter**: host commands in, host state out
//!
//! ## Deterministic Time
//!
//! Engines never sleep or spawn. Time comes from an injected [`clock::Clock`]
//! and timer deadlines are polled by the host, so the same command sequence
//! on a [`clock::ManualClock`] always produces the same relay traffic.

pub mod clock;
pub mod command;
pub mod engine;
pub mod entity;
pub mod runtime;
pub mod state;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use command::CoverCommand;
pub use engine::{CoverEngine, CoverStatus, EngineStats, TimerOutcome};
pub use entity::{EntityDescriptor, EntityState, HostCommand};
pub use runtime::{CoverRuntime, CoverUpdate, RuntimeStats};
