//! Key Scanner
//!
//! First pipeline stage: walks the keyspace and hands candidate keys to the
//! TTL filter.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;

use crate::cleaner::RunControl;
use crate::error::CleanerError;
use crate::logging::{field, Logger};
use crate::store::KeyValueStore;

pub struct KeyScanner {
    store: Arc<dyn KeyValueStore>,
    logger: Arc<dyn Logger>,
    pattern: String,
}

impl KeyScanner {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        logger: Arc<dyn Logger>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            store,
            logger,
            pattern: pattern.into(),
        }
    }

    /// Pushes matching keys into `candidates` until the scan is exhausted,
    /// cancellation is observed or the filter goes away.
    ///
    /// A scan error raises cancellation. `candidates` is dropped on return,
    /// which closes the stream for the filter.
    pub async fn run(self, control: Arc<RunControl>, candidates: mpsc::Sender<String>) {
        let mut keys = self.store.scan(&self.pattern);

        while let Some(next) = keys.next().await {
            let key = match next {
                Ok(key) => key,
                Err(source) => {
                    let err = CleanerError::Scan(source);
                    self.logger.error(
                        "redis-cleaner error iterating over keys",
                        &[field("pattern", &self.pattern), field("error", err)],
                    );
                    control.cancel();
                    break;
                }
            };

            if control.is_cancelled() {
                break;
            }

            let delivered = tokio::select! {
                biased;
                _ = control.cancelled() => false,
                sent = candidates.send(key) => sent.is_ok(),
            };
            if !delivered {
                break;
            }
        }
    }
}
