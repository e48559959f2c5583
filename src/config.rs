//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cleaner::{CleanupConfig, DEFAULT_BATCH_SIZE, DEFAULT_GUARD_KEY};
use crate::store::DEFAULT_SCAN_COUNT;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_KEY_PATTERN: &str = "*";
const DEFAULT_MIN_TTL_SECS: u64 = 86_400;
const DEFAULT_INTERVAL_SECS: u64 = 3_600;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL
    pub redis_url: String,
    /// `COUNT` hint for each `SCAN` page
    pub redis_scan_count: usize,
    /// HTTP admin server port
    pub server_port: u16,
    /// Pipeline settings
    pub cleanup: CleanupConfig,
    /// Seconds between scheduled runs, at least 1
    pub cleaner_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis connection URL (default: redis://127.0.0.1:6379)
    /// - `REDIS_SCAN_COUNT` - Keys requested per SCAN page (default: 100)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANER_KEY_PATTERN` - Glob of keys to inspect (default: *)
    /// - `CLEANER_MIN_TTL_SECS` - Delete keys whose TTL is above this (default: 86400)
    /// - `CLEANER_BATCH_SIZE` - Keys per bulk delete, < 1 means 50 (default: 50)
    /// - `CLEANER_REPORT` - Log a report after each run (default: true)
    /// - `CLEANER_GUARD_KEY` - Fleet-wide run flag (default: redis-cleaner:is-running)
    /// - `CLEANER_INTERVAL_SECS` - Scheduling interval in seconds (default: 3600)
    pub fn from_env() -> Self {
        let cleanup = CleanupConfig::new(
            env::var("CLEANER_KEY_PATTERN").unwrap_or_else(|_| DEFAULT_KEY_PATTERN.to_string()),
            env_or("CLEANER_MIN_TTL_SECS", DEFAULT_MIN_TTL_SECS),
        )
        .with_batch_size(env_or("CLEANER_BATCH_SIZE", DEFAULT_BATCH_SIZE as i64))
        .with_report(env_or("CLEANER_REPORT", true))
        .with_guard_key(
            env::var("CLEANER_GUARD_KEY").unwrap_or_else(|_| DEFAULT_GUARD_KEY.to_string()),
        );

        Self {
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            redis_scan_count: env_or("REDIS_SCAN_COUNT", DEFAULT_SCAN_COUNT).max(1),
            server_port: env_or("SERVER_PORT", 3000),
            cleanup,
            cleaner_interval: env_or("CLEANER_INTERVAL_SECS", DEFAULT_INTERVAL_SECS).max(1),
        }
    }
}

/// Parses `name` from the environment, falling back to `default` when unset
/// or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            redis_scan_count: DEFAULT_SCAN_COUNT,
            server_port: 3000,
            cleanup: CleanupConfig::new(DEFAULT_KEY_PATTERN, DEFAULT_MIN_TTL_SECS)
                .with_report(true),
            cleaner_interval: DEFAULT_INTERVAL_SECS,
        }
    }
}
