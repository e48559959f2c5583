//! Store Module
//!
//! Capability interface over the networked key-value store, with a Redis
//! adapter and an in-process implementation.

mod glob;
mod memory;
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::{StoreError, StoreResult};

// Re-export public types
pub use glob::glob_match;
pub use memory::MemoryStore;
pub use redis_store::{RedisStore, DEFAULT_SCAN_COUNT};

/// Lazy sequence of key names produced by a pattern scan.
pub type KeyStream = BoxStream<'static, Result<String, StoreError>>;

// == Key TTL ==
/// Remaining lifetime of a key as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key does not exist
    Missing,
    /// Key exists without an expiry
    Persistent,
    /// Key expires after the given duration
    Expires(Duration),
}

impl KeyTtl {
    /// True only when the key has an expiry strictly longer than `threshold`.
    pub fn exceeds(&self, threshold: Duration) -> bool {
        matches!(self, KeyTtl::Expires(remaining) if *remaining > threshold)
    }
}

// == Key Value Store ==
/// Operations the cleaner needs from the store.
///
/// Implementations must allow `scan` to be consumed while other calls run
/// concurrently against the same store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Iterates key names matching a glob pattern.
    fn scan(&self, pattern: &str) -> KeyStream;

    /// Returns the remaining TTL of a key.
    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl>;

    /// Deletes all given keys in one call, returning how many existed.
    async fn delete(&self, keys: &[String]) -> StoreResult<u64>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores a value; `None` means no expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;
}
