//! Cover position persistence.
//!
//! Estimated positions are saved across restarts using bincode. A cover is
//! matched on load by its `unique_id`, so renaming the configuration key
//! keeps the saved position while changing `unique_id` drops it.

use relay_cover_common::cover::Position;
use relay_cover_engine::{Clock, CoverRuntime};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Persisted state for a single cover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedCoverState {
    /// Cover unique id (for matching on load)
    pub unique_id: String,
    /// Estimated position, 0.0 closed .. 1.0 open
    pub position: f64,
}

/// Persisted state for all covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    /// Version of state format (for migration)
    pub version: u32,
    pub covers: Vec<PersistedCoverState>,
    /// Timestamp of last save (Unix epoch seconds)
    pub saved_at: u64,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistedState {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            covers: Vec::new(),
            saved_at: 0,
        }
    }

    /// Snapshot the live estimate of every cover.
    pub fn capture<C: Clock>(runtime: &CoverRuntime<C>) -> Self {
        Self {
            covers: runtime
                .covers()
                .map(|engine| PersistedCoverState {
                    unique_id: engine.config().unique_id.clone(),
                    position: engine.current_position().value(),
                })
                .collect(),
            ..Self::new()
        }
    }

    /// Saved position for `unique_id`, if present and in range.
    pub fn position_of(&self, unique_id: &str) -> Option<Position> {
        self.covers
            .iter()
            .find(|c| c.unique_id == unique_id)
            .and_then(|c| Position::new(c.position).ok())
    }
}

/// State persistence manager.
#[derive(Debug, Clone)]
pub struct StatePersistence {
    path: PathBuf,
}

impl StatePersistence {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save state to file, stamping `saved_at`.
    pub fn save(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        debug!("Saving cover state to {:?}", self.path);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut state = state.clone();
        state.saved_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let writer = BufWriter::new(File::create(&self.path)?);
        bincode::serialize_into(writer, &state)?;

        debug!("Saved state for {} covers to {:?}", state.covers.len(), self.path);
        Ok(())
    }

    /// Load state from file. A missing file or a different format version
    /// yields `Ok(None)`.
    pub fn load(&self) -> Result<Option<PersistedState>, PersistenceError> {
        if !self.path.exists() {
            debug!("State file {:?} does not exist, starting fresh", self.path);
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let state: PersistedState = bincode::deserialize_from(reader)?;

        if state.version != PersistedState::CURRENT_VERSION {
            warn!(
                "State file version {} differs from current {}, starting fresh",
                state.version,
                PersistedState::CURRENT_VERSION
            );
            return Ok(None);
        }

        info!(
            "Loaded state for {} covers from {:?} (saved at {})",
            state.covers.len(),
            self.path,
            state.saved_at
        );
        Ok(Some(state))
    }

    pub fn delete(&self) -> Result<(), PersistenceError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!("Deleted state file {:?}", self.path);
        }
        Ok(())
    }
}
