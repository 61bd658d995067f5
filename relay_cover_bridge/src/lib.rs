//! # Relay Cover Bridge
//!
//! Host process around the cover engine. Reads cover commands line by line,
//! writes relay publishes as `<topic> <payload>` lines, publishes cover
//! state as JSON, and keeps estimated positions across restarts.

pub mod bridge;
pub mod channel;
pub mod error;
pub mod host;
pub mod state;

pub use bridge::{Bridge, BridgeOptions};
pub use channel::LineChannel;
pub use error::BridgeError;
