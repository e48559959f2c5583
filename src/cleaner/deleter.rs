//! Batch Deleter
//!
//! Last pipeline stage: groups matched keys into fixed-size batches and
//! removes each batch with one bulk delete.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cleaner::RunControl;
use crate::error::CleanerError;
use crate::logging::{field, Logger};
use crate::store::KeyValueStore;

pub struct BatchDeleter {
    store: Arc<dyn KeyValueStore>,
    logger: Arc<dyn Logger>,
    batch_size: usize,
}

impl BatchDeleter {
    pub fn new(store: Arc<dyn KeyValueStore>, logger: Arc<dyn Logger>, batch_size: usize) -> Self {
        Self {
            store,
            logger,
            batch_size: batch_size.max(1),
        }
    }

    /// Drains `matches`, flushing a full batch before accepting the next key
    /// and the remainder once the stream ends.
    pub async fn run(self, control: Arc<RunControl>, mut matches: mpsc::Receiver<String>) {
        let mut batch = Vec::new();

        while let Some(key) = matches.recv().await {
            if batch.len() >= self.batch_size {
                self.flush(&control, &mut batch).await;
            }
            batch.push(key);
        }

        if !batch.is_empty() {
            self.flush(&control, &mut batch).await;
        }
    }

    /// Issues one bulk delete. The batch is counted as deleted whether or not
    /// the call succeeds, so the run total is an upper bound.
    async fn flush(&self, control: &RunControl, batch: &mut Vec<String>) {
        if let Err(source) = self.store.delete(batch).await {
            let err = CleanerError::Delete {
                keys: batch.len(),
                source,
            };
            self.logger.error(
                "error while redis-cleaner deleting keys",
                &[field("error", err)],
            );
            control.cancel();
        }
        control.record_deleted(batch.len());
        batch.clear();
    }
}
