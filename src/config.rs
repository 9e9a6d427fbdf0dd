//! Configuration Module
//!
//! Loads the cache configuration from environment variables.

use std::env;
use std::str::FromStr;

use tracing::warn;

// == Defaults ==
pub const DEFAULT_TTL_SECS: u64 = 600;
pub const DEFAULT_MAX_KEYS: usize = 1000;
pub const DEFAULT_CHECK_PERIOD_SECS: u64 = 60;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_EXCELLENT_THRESHOLD: f64 = 0.8;
pub const DEFAULT_GOOD_THRESHOLD: f64 = 0.6;

/// Cache and admin server configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// TTL in seconds applied when a caller does not pass one
    pub default_ttl: u64,
    /// Maximum number of entries the store can hold
    pub max_entries: usize,
    /// Interval in seconds between expiration sweeps
    pub check_period: u64,
    /// Enables debug-level cache logging
    pub debug: bool,
    /// Collapses concurrent misses on the same key into one fetch
    pub single_flight: bool,
    /// Hit rate above which the cache is rated "Excellent"
    pub excellent_threshold: f64,
    /// Hit rate above which the cache is rated "Good"
    pub good_threshold: f64,
    /// Admin HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 600)
    /// - `CACHE_MAX_KEYS` - Maximum cache entries (default: 1000)
    /// - `CACHE_CHECK_PERIOD` - Sweep frequency in seconds (default: 60)
    /// - `CACHE_DEBUG` - Debug logging toggle (default: false)
    /// - `CACHE_SINGLE_FLIGHT` - Miss collapsing toggle (default: true)
    /// - `CACHE_EXCELLENT_THRESHOLD` - Hit rate for "Excellent" (default: 0.8)
    /// - `CACHE_GOOD_THRESHOLD` - Hit rate for "Good" (default: 0.6)
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    pub fn from_env() -> Self {
        Self {
            default_ttl: parse_var("CACHE_DEFAULT_TTL", DEFAULT_TTL_SECS),
            max_entries: parse_var("CACHE_MAX_KEYS", DEFAULT_MAX_KEYS),
            check_period: parse_var("CACHE_CHECK_PERIOD", DEFAULT_CHECK_PERIOD_SECS),
            debug: parse_flag("CACHE_DEBUG", false),
            single_flight: parse_flag("CACHE_SINGLE_FLIGHT", true),
            excellent_threshold: parse_var("CACHE_EXCELLENT_THRESHOLD", DEFAULT_EXCELLENT_THRESHOLD),
            good_threshold: parse_var("CACHE_GOOD_THRESHOLD", DEFAULT_GOOD_THRESHOLD),
            server_port: parse_var("SERVER_PORT", DEFAULT_SERVER_PORT),
        }
        .normalized()
    }

    /// Repairs values that would break cache invariants.
    ///
    /// A zero TTL or zero sweep period falls back to the default, a non-finite
    /// threshold falls back to its default, and the "Good" threshold is
    /// clamped so it never exceeds "Excellent".
    pub fn normalized(mut self) -> Self {
        if self.default_ttl == 0 {
            warn!("default TTL of 0s is not allowed, using {}s", DEFAULT_TTL_SECS);
            self.default_ttl = DEFAULT_TTL_SECS;
        }
        if self.check_period == 0 {
            self.check_period = DEFAULT_CHECK_PERIOD_SECS;
        }
        if !self.excellent_threshold.is_finite() {
            warn!(
                value = self.excellent_threshold,
                "excellent threshold is not a number, using {}", DEFAULT_EXCELLENT_THRESHOLD
            );
            self.excellent_threshold = DEFAULT_EXCELLENT_THRESHOLD;
        }
        if !self.good_threshold.is_finite() {
            warn!(
                value = self.good_threshold,
                "good threshold is not a number, using {}", DEFAULT_GOOD_THRESHOLD
            );
            self.good_threshold = DEFAULT_GOOD_THRESHOLD;
        }
        self.excellent_threshold = self.excellent_threshold.clamp(0.0, 1.0);
        self.good_threshold = self.good_threshold.clamp(0.0, self.excellent_threshold);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL_SECS,
            max_entries: DEFAULT_MAX_KEYS,
            check_period: DEFAULT_CHECK_PERIOD_SECS,
            debug: false,
            single_flight: true,
            excellent_threshold: DEFAULT_EXCELLENT_THRESHOLD,
            good_threshold: DEFAULT_GOOD_THRESHOLD,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    parse_value(name, env::var(name).ok().as_deref(), default)
}

fn parse_flag(name: &str, default: bool) -> bool {
    parse_flag_value(name, env::var(name).ok().as_deref(), default)
}

/// Parses `raw`, falling back to `default` when it is unset or malformed.
fn parse_value<T: FromStr>(name: &str, raw: Option<&str>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(var = name, value = raw, "invalid configuration value, using default");
            default
        }
    }
}

fn parse_flag_value(name: &str, raw: Option<&str>, default: bool) -> bool {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(var = name, value = raw, "invalid configuration flag, using default");
            default
        }
    }
}
