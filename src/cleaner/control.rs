//! Run Control
//!
//! The only state shared between pipeline stages: the cancellation signal
//! and the deleted-key counter.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Per-run shared state, handed to each stage behind an `Arc`.
#[derive(Debug, Default)]
pub struct RunControl {
    cancel: CancellationToken,
    deleted: AtomicU64,
}

impl RunControl {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deleted: AtomicU64::new(0),
        }
    }

    /// Raises pipeline-wide cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once cancellation has been raised.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Adds an attempted batch to the deleted-key counter.
    pub fn record_deleted(&self, count: usize) {
        self.deleted.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn deleted(&self) -> u64 {
        self.deleted.load(Ordering::Relaxed)
    }
}
