//! In-memory Store
//!
//! Ordered key-value map with per-key expiry, used as an embeddable store
//! and as the test double for the Redis adapter.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::{stream, StreamExt};
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::store::{glob_match, KeyStream, KeyTtl, KeyValueStore};

// == Entry ==
/// A stored value with its optional deadline.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    /// An entry is expired once the current time reaches its deadline.
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }

    fn ttl(&self, now: Instant) -> KeyTtl {
        match self.expires_at {
            Some(deadline) => KeyTtl::Expires(deadline.saturating_duration_since(now)),
            None => KeyTtl::Persistent,
        }
    }
}

// == Memory Store ==
/// Shared in-process store. Clones point at the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
    /// Simulated round-trip time added to every call
    latency: Duration,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the same data that answers after `latency`.
    pub fn handle_with_latency(&self, latency: Duration) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            latency,
        }
    }

    // == Inspection ==
    /// Number of live (unexpired) keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| !entry.is_expired(now)).count()
    }

    /// Returns true if the store holds no live keys.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Live keys matching `pattern`, in key order.
    pub async fn keys(&self, pattern: &str) -> Vec<String> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        matching_keys(&entries, pattern, now)
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn matching_keys(entries: &BTreeMap<String, Entry>, pattern: &str, now: Instant) -> Vec<String> {
    entries
        .iter()
        .filter(|(key, entry)| !entry.is_expired(now) && glob_match(pattern, key))
        .map(|(key, _)| key.clone())
        .collect()
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    /// Snapshots the matching keys on first poll; keys deleted afterwards are
    /// still yielded, mirroring `SCAN`'s weak guarantees.
    fn scan(&self, pattern: &str) -> KeyStream {
        let store = self.clone();
        let pattern = pattern.to_string();

        stream::once(async move {
            store.round_trip().await;
            let keys = store.keys(&pattern).await;
            stream::iter(keys.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        self.round_trip().await;
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => entry.ttl(now),
            _ => KeyTtl::Missing,
        })
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<u64> {
        self.round_trip().await;
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|entry| !entry.is_expired(now))
            .count();
        Ok(removed as u64)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.round_trip().await;
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries.get(key).is_some_and(|entry| !entry.is_expired(now)))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.round_trip().await;
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.round_trip().await;
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry::new(value.to_string(), ttl));
        Ok(())
    }
}
