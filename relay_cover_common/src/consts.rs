//! System-wide constants for the relay cover workspace.
//!
//! Single source of truth for numeric limits, defaults and paths.
//! Imported by all crates — no duplication permitted.

/// Fully closed position.
pub const POSITION_CLOSED: f64 = 0.0;

/// Fully open position.
pub const POSITION_OPEN: f64 = 1.0;

/// Two positions closer than this are treated as equal.
pub const POSITION_EPSILON: f64 = 1e-9;

/// Host-facing percentage scale (0 = closed, 100 = open).
pub const PERCENT_MAX: u8 = 100;

/// Minimum full-travel duration [ms].
pub const TRAVEL_TIME_MS_MIN: u64 = 1;

/// Maximum full-travel duration [ms] (10 minutes).
pub const TRAVEL_TIME_MS_MAX: u64 = 600_000;

/// Default extra closing time for a reference run [ms].
pub const REFERENCE_OVERTRAVEL_MS_DEFAULT: u64 = 1_000;

/// Maximum extra closing time for a reference run [ms].
pub const REFERENCE_OVERTRAVEL_MS_MAX: u64 = 60_000;

/// Default live state report interval while a cover moves [ms].
pub const REPORT_INTERVAL_MS_DEFAULT: u64 = 1_000;

/// Report interval bounds [ms].
pub const REPORT_INTERVAL_MS_MIN: u64 = 50;
pub const REPORT_INTERVAL_MS_MAX: u64 = 60_000;

/// Display name prefix used when neither `name` nor `friendly_name` is set.
pub const DEFAULT_NAME: &str = "MQTT Relay Cover";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/relay_cover/covers.toml";

/// Default state file name (persisted cover positions).
pub const DEFAULT_STATE_FILE: &str = "cover_positions";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(POSITION_CLOSED < POSITION_OPEN);
        assert!(POSITION_EPSILON > 0.0 && POSITION_EPSILON < 1e-6);
        assert!(TRAVEL_TIME_MS_MIN > 0);
        assert!(TRAVEL_TIME_MS_MIN < TRAVEL_TIME_MS_MAX);
        assert!(REFERENCE_OVERTRAVEL_MS_DEFAULT <= REFERENCE_OVERTRAVEL_MS_MAX);
        assert!(REPORT_INTERVAL_MS_MIN <= REPORT_INTERVAL_MS_DEFAULT);
        assert!(REPORT_INTERVAL_MS_DEFAULT <= REPORT_INTERVAL_MS_MAX);
    }
}
