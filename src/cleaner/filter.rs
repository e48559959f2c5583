//! TTL Filter
//!
//! Second pipeline stage: keeps only keys whose remaining TTL is above the
//! configured minimum.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::cleaner::RunControl;
use crate::error::CleanerError;
use crate::logging::{field, Logger};
use crate::store::KeyValueStore;

pub struct TtlFilter {
    store: Arc<dyn KeyValueStore>,
    logger: Arc<dyn Logger>,
    min_ttl: Duration,
}

impl TtlFilter {
    pub fn new(store: Arc<dyn KeyValueStore>, logger: Arc<dyn Logger>, min_ttl: Duration) -> Self {
        Self {
            store,
            logger,
            min_ttl,
        }
    }

    /// Drains `candidates`, forwarding keys with TTL strictly above the
    /// minimum into `matches`.
    ///
    /// Lookup failures raise cancellation but the remaining candidates are
    /// still inspected. `matches` is dropped on return.
    pub async fn run(
        self,
        control: Arc<RunControl>,
        mut candidates: mpsc::Receiver<String>,
        matches: mpsc::Sender<String>,
    ) {
        while let Some(key) = candidates.recv().await {
            match self.store.ttl(&key).await {
                Ok(ttl) => {
                    if ttl.exceeds(self.min_ttl) && matches.send(key).await.is_err() {
                        break;
                    }
                }
                Err(source) => {
                    let err = CleanerError::Inspect { key, source };
                    self.logger.error(
                        "error while redis-cleaner getting TTL",
                        &[field("error", err)],
                    );
                    control.cancel();
                }
            }
        }
    }
}
