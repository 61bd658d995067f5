//! Bridge error type.

use relay_cover_common::config::ConfigError;
use thiserror::Error;

use crate::state::PersistenceError;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
