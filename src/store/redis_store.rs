//! Redis Store
//!
//! `KeyValueStore` adapter over an async multiplexed Redis connection.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use redis::aio::MultiplexedConnection;
use redis::Client;

use crate::error::StoreResult;
use crate::store::{KeyStream, KeyTtl, KeyValueStore};

/// `COUNT` hint sent with every `SCAN` page.
pub const DEFAULT_SCAN_COUNT: usize = 100;

// == Redis Store ==
/// Redis-backed store. Clones share the underlying connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    scan_count: usize,
}

impl RedisStore {
    // == Constructor ==
    /// Opens a multiplexed connection to the server at `url`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn,
            scan_count: DEFAULT_SCAN_COUNT,
        })
    }

    /// Overrides the `SCAN` page size hint.
    pub fn with_scan_count(mut self, scan_count: usize) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }
}

// == Scan Cursor ==
/// State threaded through the scan stream between pages.
struct ScanCursor {
    conn: MultiplexedConnection,
    pattern: String,
    count: usize,
    cursor: u64,
    pending: VecDeque<String>,
    finished: bool,
}

async fn next_key(mut state: ScanCursor) -> StoreResult<Option<(String, ScanCursor)>> {
    loop {
        if let Some(key) = state.pending.pop_front() {
            return Ok(Some((key, state)));
        }
        if state.finished {
            return Ok(None);
        }

        let (cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(state.cursor)
            .arg("MATCH")
            .arg(state.pattern.as_str())
            .arg("COUNT")
            .arg(state.count)
            .query_async(&mut state.conn)
            .await?;

        state.cursor = cursor;
        state.finished = cursor == 0;
        state.pending.extend(keys);
    }
}

/// Maps a `PTTL` reply: -2 missing key, -1 no expiry.
fn ttl_from_millis(raw: i64) -> KeyTtl {
    match raw {
        -2 => KeyTtl::Missing,
        r if r < 0 => KeyTtl::Persistent,
        r => KeyTtl::Expires(Duration::from_millis(r as u64)),
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn scan(&self, pattern: &str) -> KeyStream {
        let state = ScanCursor {
            conn: self.conn.clone(),
            pattern: pattern.to_string(),
            count: self.scan_count,
            cursor: 0,
            pending: VecDeque::new(),
            finished: false,
        };
        stream::try_unfold(state, next_key).boxed()
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        let mut conn = self.conn.clone();
        let raw: i64 = redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
        Ok(ttl_from_millis(raw))
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(key.as_str());
        }
        let removed: u64 = cmd.query_async(&mut conn).await?;
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let found: u64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(found > 0)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg((ttl.as_millis() as u64).max(1));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_ttl_reply_mapping() {
        assert_eq!(ttl_from_millis(-2), KeyTtl::Missing);
        assert_eq!(ttl_from_millis(-1), KeyTtl::Persistent);
        assert_eq!(
            ttl_from_millis(3_600_000),
            KeyTtl::Expires(Duration::from_secs(3600))
        );
        assert_eq!(ttl_from_millis(0), KeyTtl::Expires(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let result = RedisStore::connect("not a redis url").await;
        assert!(matches!(result, Err(StoreError::Redis(_))));
    }
}
