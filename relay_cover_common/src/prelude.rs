//! Prelude module for common re-exports.
//!
//! ```rust
//! use relay_cover_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, CoverConfig, LoadedConfig, LogLevel, RuntimeConfig, SharedConfig,
};

// ─── Domain Types ───────────────────────────────────────────────────
pub use crate::cover::{CoverError, CoverState, Motion, Position, RelayCommand};

// ─── Relay Channel ──────────────────────────────────────────────────
pub use crate::channel::{ChannelError, RelayChannel, RelayPayloads, SharedChannel};
