//! Run Guard
//!
//! Fleet-wide "already running" flag kept as a single key in the store.
//! Check-then-set is not atomic; two replicas starting together can both
//! acquire it.

use std::sync::Arc;

use crate::error::StoreResult;
use crate::logging::{field, Logger};
use crate::store::KeyValueStore;

/// Value written to the guard key.
const GUARD_VALUE: &str = "1";

#[derive(Clone)]
pub struct RunGuard {
    store: Arc<dyn KeyValueStore>,
    logger: Arc<dyn Logger>,
    key: String,
}

impl RunGuard {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        logger: Arc<dyn Logger>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            logger,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Sets the guard key if nobody holds it.
    ///
    /// Returns `Ok(false)` without touching the store when the key already
    /// exists. A failed existence check is returned; a failed write is only
    /// logged and the guard counts as acquired.
    pub async fn try_acquire(&self) -> StoreResult<bool> {
        if self.store.exists(&self.key).await? {
            return Ok(false);
        }

        if let Err(err) = self.store.set(&self.key, GUARD_VALUE, None).await {
            self.logger.error(
                "error setting redis-cleaner running status",
                &[field("guard_key", &self.key), field("error", err)],
            );
        }
        Ok(true)
    }

    /// Deletes the guard key unconditionally.
    pub async fn release(&self) -> StoreResult<()> {
        self.store.delete(&[self.key.clone()]).await?;
        Ok(())
    }
}
