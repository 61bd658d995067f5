//! Relay command channel contract.
//!
//! The engine never owns a transport connection. It holds a shared
//! [`RelayChannel`] and calls `publish()` once per relay-state transition.
//! Delivery is fire-and-forget: there is no acknowledgement and the engine
//! never retries.

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

use crate::cover::RelayCommand;

/// Error type for relay publishes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Transport not connected / not available.
    #[error("relay channel unavailable: {0}")]
    Unavailable(String),

    /// Write to the underlying transport failed.
    #[error("relay channel I/O error: {0}")]
    Io(String),
}

/// Minimal "send command" capability.
///
/// Implementations must be cheap to call from the engine's timeline and must
/// not block on acknowledgements.
pub trait RelayChannel: Send + Sync {
    /// Publish `payload` to `topic`.
    fn publish(&self, topic: &str, payload: &str) -> Result<(), ChannelError>;
}

/// Shared handle used by engines.
pub type SharedChannel = Arc<dyn RelayChannel>;

/// Per-cover destination and literal payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayPayloads {
    pub topic: String,
    pub open: String,
    pub close: String,
    pub stop: String,
}

impl RelayPayloads {
    /// Payload for the given command.
    #[inline]
    pub fn payload(&self, command: RelayCommand) -> &str {
        match command {
            RelayCommand::Open => &self.open,
            RelayCommand::Close => &self.close,
            RelayCommand::Stop => &self.stop,
        }
    }
}

/// One captured publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
}

/// In-memory channel that records every publish.
///
/// Clones share the same log. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    log: Arc<Mutex<Vec<Published>>>,
    fail_with: Arc<Mutex<Option<ChannelError>>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all publishes so far.
    pub fn published(&self) -> Vec<Published> {
        self.log.lock().clone()
    }

    /// Payloads only, in publish order.
    pub fn payloads(&self) -> Vec<String> {
        self.log.lock().iter().map(|p| p.payload.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }

    /// Make subsequent publishes fail (`None` restores delivery).
    /// Failed publishes are not recorded.
    pub fn set_failure(&self, error: Option<ChannelError>) {
        *self.fail_with.lock() = error;
    }
}

impl RelayChannel for RecordingChannel {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), ChannelError> {
        if let Some(err) = self.fail_with.lock().clone() {
            return Err(err);
        }
        self.log.lock().push(Published {
            topic: topic.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }
}
