//! Cleanup Configuration
//!
//! Plain value type describing one cleaner's behaviour.

use std::time::Duration;

/// Batch size used when none, zero or a negative value is requested.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Key whose presence marks a run in progress somewhere in the fleet.
pub const DEFAULT_GUARD_KEY: &str = "redis-cleaner:is-running";

// == Cleanup Config ==
/// Settings for a cleaner. `batch_size` is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupConfig {
    key_pattern: String,
    min_ttl_secs: u64,
    batch_size: usize,
    report_enabled: bool,
    guard_key: String,
}

impl CleanupConfig {
    /// Deletes keys matching `key_pattern` whose TTL is above `min_ttl_secs`.
    pub fn new(key_pattern: impl Into<String>, min_ttl_secs: u64) -> Self {
        Self {
            key_pattern: key_pattern.into(),
            min_ttl_secs,
            batch_size: DEFAULT_BATCH_SIZE,
            report_enabled: false,
            guard_key: DEFAULT_GUARD_KEY.to_string(),
        }
    }

    /// Sets the bulk-delete size; values below 1 fall back to the default.
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = if batch_size < 1 {
            DEFAULT_BATCH_SIZE
        } else {
            usize::try_from(batch_size).unwrap_or(DEFAULT_BATCH_SIZE)
        };
        self
    }

    /// Enables or disables the end-of-run report log line.
    pub fn with_report(mut self, enabled: bool) -> Self {
        self.report_enabled = enabled;
        self
    }

    pub fn with_guard_key(mut self, guard_key: impl Into<String>) -> Self {
        self.guard_key = guard_key.into();
        self
    }

    pub fn key_pattern(&self) -> &str {
        &self.key_pattern
    }

    pub fn min_ttl_secs(&self) -> u64 {
        self.min_ttl_secs
    }

    pub fn min_ttl(&self) -> Duration {
        Duration::from_secs(self.min_ttl_secs)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn report_enabled(&self) -> bool {
        self.report_enabled
    }

    pub fn guard_key(&self) -> &str {
        &self.guard_key
    }
}
