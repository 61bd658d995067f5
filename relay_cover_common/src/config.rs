//! Configuration loading traits and types.
//!
//! Covers are configured in a single TOML file. Raw entries are deserialized
//! with `serde`, then validated once into typed [`CoverConfig`] values.
//! Validation failures are reported at startup; no cover is instantiated from
//! an invalid entry.
//!
//! # Usage
//!
//! ```rust,no_run
//! use relay_cover_common::config::{load_config, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let loaded = load_config(Path::new("covers.toml"))?;
//!     println!("Service: {}, covers: {}", loaded.shared.service_name, loaded.covers.len());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::channel::RelayPayloads;
use crate::consts::{
    DEFAULT_NAME, PERCENT_MAX, REFERENCE_OVERTRAVEL_MS_DEFAULT, REFERENCE_OVERTRAVEL_MS_MAX,
    REPORT_INTERVAL_MS_DEFAULT, REPORT_INTERVAL_MS_MAX, REPORT_INTERVAL_MS_MIN,
    TRAVEL_TIME_MS_MAX, TRAVEL_TIME_MS_MIN,
};
use crate::cover::{Motion, Position};

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `EnvFilter`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "relay-cover-bridge"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "relay-cover-bridge".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation: any serde-deserializable struct can be loaded.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Runtime Section ────────────────────────────────────────────────

/// Host process settings (`[runtime]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Live state report interval while any cover moves [ms].
    #[serde(default = "default_report_interval")]
    pub report_interval_ms: u64,

    /// Optional persisted positions file.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

fn default_report_interval() -> u64 {
    REPORT_INTERVAL_MS_DEFAULT
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            report_interval_ms: REPORT_INTERVAL_MS_DEFAULT,
            state_file: None,
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(REPORT_INTERVAL_MS_MIN..=REPORT_INTERVAL_MS_MAX).contains(&self.report_interval_ms) {
            return Err(ConfigError::ValidationError(format!(
                "report_interval_ms {} out of range [{}, {}]",
                self.report_interval_ms, REPORT_INTERVAL_MS_MIN, REPORT_INTERVAL_MS_MAX
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

// ─── Cover Entry (raw) ──────────────────────────────────────────────

/// One `[covers.<object_id>]` table as written by the operator.
///
/// Travel times are in milliseconds. String fields default to empty so that
/// a missing topic or payload is reported by `validate` with the cover name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoverEntry {
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub friendly_name: Option<String>,

    /// Full-open duration [ms].
    #[serde(default)]
    pub opening_time: u64,
    /// Full-close duration [ms]; falls back to `opening_time`.
    #[serde(default)]
    pub closing_time: Option<u64>,

    #[serde(default)]
    pub mqtt_command_topic: String,
    #[serde(default)]
    pub mqtt_payload_open: String,
    #[serde(default)]
    pub mqtt_payload_close: String,
    #[serde(default)]
    pub mqtt_payload_stop: String,

    /// JSON state snapshots are published here when set.
    #[serde(default)]
    pub mqtt_state_topic: Option<String>,

    /// Startup position [%] when nothing is restored.
    #[serde(default)]
    pub initial_position: u8,

    /// Publish stop when a full-travel timer fires.
    #[serde(default = "default_stop_at_travel_end")]
    pub stop_at_travel_end: bool,

    /// Extra closing time for a reference run [ms].
    #[serde(default = "default_reference_overtravel")]
    pub reference_overtravel: u64,
}

fn default_stop_at_travel_end() -> bool {
    true
}

fn default_reference_overtravel() -> u64 {
    REFERENCE_OVERTRAVEL_MS_DEFAULT
}

fn validate_travel_time(object_id: &str, key: &str, ms: u64) -> Result<Duration, ConfigError> {
    if !(TRAVEL_TIME_MS_MIN..=TRAVEL_TIME_MS_MAX).contains(&ms) {
        return Err(ConfigError::ValidationError(format!(
            "cover '{object_id}': {key} {ms} out of range [{TRAVEL_TIME_MS_MIN}, {TRAVEL_TIME_MS_MAX}] ms"
        )));
    }
    Ok(Duration::from_millis(ms))
}

fn require(object_id: &str, key: &str, value: &str) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "cover '{object_id}': {key} is required"
        )));
    }
    Ok(value.to_string())
}

// ─── Cover Config (validated) ───────────────────────────────────────

/// Immutable, validated configuration of one cover.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverConfig {
    /// Table key in the configuration file.
    pub object_id: String,
    pub unique_id: String,
    pub name: String,
    pub opening_time: Duration,
    pub closing_time: Duration,
    pub relay: RelayPayloads,
    pub state_topic: Option<String>,
    pub initial_position: Position,
    pub stop_at_travel_end: bool,
    pub reference_overtravel: Duration,
}

impl CoverConfig {
    /// Validate a raw entry.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` naming the cover if a travel time is
    /// zero or out of bounds, a topic/payload is missing, or
    /// `initial_position` exceeds 100.
    pub fn from_entry(object_id: &str, entry: &CoverEntry) -> Result<Self, ConfigError> {
        let opening_time = validate_travel_time(object_id, "opening_time", entry.opening_time)?;
        let closing_time = validate_travel_time(
            object_id,
            "closing_time",
            entry.closing_time.unwrap_or(entry.opening_time),
        )?;

        let relay = RelayPayloads {
            topic: require(object_id, "mqtt_command_topic", &entry.mqtt_command_topic)?,
            open: require(object_id, "mqtt_payload_open", &entry.mqtt_payload_open)?,
            close: require(object_id, "mqtt_payload_close", &entry.mqtt_payload_close)?,
            stop: require(object_id, "mqtt_payload_stop", &entry.mqtt_payload_stop)?,
        };

        if entry.initial_position > PERCENT_MAX {
            return Err(ConfigError::ValidationError(format!(
                "cover '{object_id}': initial_position {} out of range [0, {PERCENT_MAX}]",
                entry.initial_position
            )));
        }
        let initial_position = Position::from_percent(f64::from(entry.initial_position))
            .map_err(|e| ConfigError::ValidationError(format!("cover '{object_id}': {e}")))?;

        if entry.reference_overtravel > REFERENCE_OVERTRAVEL_MS_MAX {
            return Err(ConfigError::ValidationError(format!(
                "cover '{object_id}': reference_overtravel {} exceeds {REFERENCE_OVERTRAVEL_MS_MAX} ms",
                entry.reference_overtravel
            )));
        }

        let state_topic = match entry.mqtt_state_topic.as_deref() {
            Some(topic) => Some(require(object_id, "mqtt_state_topic", topic)?),
            None => None,
        };

        let unique_id = entry
            .unique_id
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| object_id.to_string());
        let name = entry
            .name
            .clone()
            .or_else(|| entry.friendly_name.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{DEFAULT_NAME} {unique_id}"));

        Ok(Self {
            object_id: object_id.to_string(),
            unique_id,
            name,
            opening_time,
            closing_time,
            relay,
            state_topic,
            initial_position,
            stop_at_travel_end: entry.stop_at_travel_end,
            reference_overtravel: Duration::from_millis(entry.reference_overtravel),
        })
    }

    /// Full-travel duration for the given direction (`ZERO` for idle).
    #[inline]
    pub fn travel_time(&self, motion: Motion) -> Duration {
        match motion {
            Motion::Idle => Duration::ZERO,
            Motion::Opening => self.opening_time,
            Motion::Closing => self.closing_time,
        }
    }
}

// ─── Top-Level File ─────────────────────────────────────────────────

/// Complete configuration file as deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Covers keyed by object id (sorted for deterministic startup order).
    #[serde(default)]
    pub covers: BTreeMap<String, CoverEntry>,
}

/// Validated configuration bundle, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub shared: SharedConfig,
    pub runtime: RuntimeConfig,
    pub covers: Vec<CoverConfig>,
}

impl BridgeConfig {
    /// Run all validation rules and build typed cover configs.
    ///
    /// Fails fast on the first invalid cover.
    pub fn validate(self) -> Result<LoadedConfig, ConfigError> {
        self.shared.validate()?;
        self.runtime.validate()?;

        if self.covers.is_empty() {
            return Err(ConfigError::ValidationError(
                "no covers configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut covers = Vec::with_capacity(self.covers.len());
        for (object_id, entry) in &self.covers {
            let cover = CoverConfig::from_entry(object_id, entry)?;
            if !seen.insert(cover.unique_id.clone()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate unique_id '{}' (cover '{object_id}')",
                    cover.unique_id
                )));
            }
            debug!(
                "cover '{}' ({}): open={:?} close={:?} topic={}",
                cover.object_id, cover.name, cover.opening_time, cover.closing_time, cover.relay.topic
            );
            covers.push(cover);
        }

        Ok(LoadedConfig {
            shared: self.shared,
            runtime: self.runtime,
            covers,
        })
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    BridgeConfig::load(path)?.validate()
}

/// Parse and validate configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<LoadedConfig, ConfigError> {
    BridgeConfig::from_toml(content)?.validate()
}
