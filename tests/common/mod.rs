//! Shared helpers for integration tests: keyspace seeding, a fault-injecting
//! store wrapper and a logger that records what it was told.

#![allow(dead_code)]

use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;

use redis_cleaner::cleaner::DEFAULT_GUARD_KEY;
use redis_cleaner::error::{StoreError, StoreResult};
use redis_cleaner::logging::{Field, Logger};
use redis_cleaner::store::{KeyStream, KeyTtl, KeyValueStore, MemoryStore};

pub const PATTERN: &str = "test:key:*";
pub const KEEP_KEY: &str = "test:key:not-expire";
pub const LONG_TTL: Duration = Duration::from_secs(3600);
pub const SHORT_TTL: Duration = Duration::from_secs(60);

/// Seeds one 60s key that must survive and `long` keys with a one hour TTL.
pub async fn seed_keyspace(store: &MemoryStore, long: usize) {
    store
        .set(KEEP_KEY, "not-expire", Some(SHORT_TTL))
        .await
        .unwrap();
    for i in 1..=long {
        store
            .set(&format!("test:key:{}", i), &i.to_string(), Some(LONG_TTL))
            .await
            .unwrap();
    }
}

/// Number of seeded long-TTL keys still present.
pub async fn remaining_long_keys(store: &MemoryStore) -> usize {
    store
        .keys(PATTERN)
        .await
        .into_iter()
        .filter(|key| key != KEEP_KEY)
        .count()
}

/// Asserts the 60s key is still there with its value and expiry.
pub async fn assert_keep_key_intact(store: &MemoryStore) {
    assert_eq!(
        store.get(KEEP_KEY).await.unwrap(),
        Some("not-expire".to_string())
    );
    match store.ttl(KEEP_KEY).await.unwrap() {
        KeyTtl::Expires(remaining) => assert!(remaining <= SHORT_TTL),
        other => panic!("keep key lost its expiry: {:?}", other),
    }
}

// == Faulty Store ==
/// Which store calls should fail.
#[derive(Debug, Default, Clone)]
pub struct Faults {
    pub exists: bool,
    pub set: bool,
    pub ttl: bool,
    /// Fails bulk deletes of data keys; guard releases still succeed
    pub delete: bool,
    /// Yield this many keys, then a scan error
    pub scan_error_after: Option<usize>,
}

/// Wraps a `MemoryStore`, injecting failures and recording delete batches.
pub struct FaultyStore {
    inner: MemoryStore,
    faults: Faults,
    batches: Mutex<Vec<usize>>,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore, faults: Faults) -> Self {
        Self {
            inner,
            faults,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Sizes of every bulk delete of data keys, in call order.
    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().clone()
    }
}

fn injected(operation: &str) -> StoreError {
    StoreError::Unavailable(format!("injected {} failure", operation))
}

#[async_trait]
impl KeyValueStore for FaultyStore {
    fn scan(&self, pattern: &str) -> KeyStream {
        let keys = self.inner.scan(pattern);
        match self.faults.scan_error_after {
            None => keys,
            Some(count) => keys
                .take(count)
                .chain(stream::once(async { Err(injected("scan")) }))
                .boxed(),
        }
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        if self.faults.ttl {
            return Err(injected("ttl"));
        }
        self.inner.ttl(key).await
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<u64> {
        let is_guard_release = keys.iter().any(|key| key == DEFAULT_GUARD_KEY);
        if !is_guard_release {
            self.batches.lock().push(keys.len());
            if self.faults.delete {
                return Err(injected("delete"));
            }
        }
        self.inner.delete(keys).await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        if self.faults.exists {
            return Err(injected("exists"));
        }
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        if self.faults.set {
            return Err(injected("set"));
        }
        self.inner.set(key, value, ttl).await
    }
}

// == Recording Logger ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub level: Level,
    pub message: String,
    pub fields: Vec<Field>,
}

/// Logger that keeps every line for later assertions.
#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<Entry>>,
}

impl RecordingLogger {
    fn record(&self, level: Level, message: &str, fields: &[Field]) {
        self.entries.lock().push(Entry {
            level,
            message: message.to_string(),
            fields: fields.to_vec(),
        });
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().clone()
    }

    pub fn has(&self, level: Level, message: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|entry| entry.level == level && entry.message == message)
    }

    /// Value of `key` on the first line logged with `message`.
    pub fn field(&self, message: &str, key: &str) -> Option<String> {
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.message == message)
            .and_then(|entry| entry.fields.iter().find(|f| f.key == key))
            .map(|f| f.value.clone())
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str, fields: &[Field]) {
        self.record(Level::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: &[Field]) {
        self.record(Level::Warn, message, fields);
    }

    fn error(&self, message: &str, fields: &[Field]) {
        self.record(Level::Error, message, fields);
    }
}
