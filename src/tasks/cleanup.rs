//! Scheduled Cleaner Task
//!
//! Background task that runs the cleaner now and then on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cleaner::{Cleaner, RunOutcome};

/// Spawns a background task that runs `cleaner` immediately and then every
/// `interval_secs` seconds.
///
/// Run errors are logged and the schedule continues. Cancelling `shutdown`
/// stops the schedule and lets an in-flight run drain and release its guard
/// before the task ends.
///
/// # Example
/// ```ignore
/// let shutdown = CancellationToken::new();
/// let handle = spawn_cleaner_task(cleaner.clone(), 3600, shutdown.clone());
/// // Later, during shutdown:
/// shutdown.cancel();
/// handle.await?;
/// ```
pub fn spawn_cleaner_task(
    cleaner: Arc<Cleaner>,
    interval_secs: u64,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting redis-cleaner task with interval of {} seconds",
            period.as_secs()
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match cleaner.run_until(&shutdown).await {
                Ok(RunOutcome::Completed(report)) => {
                    debug!(
                        deleted = report.deleted_count,
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "Scheduled redis-cleaner run finished"
                    );
                }
                Ok(RunOutcome::AlreadyRunning) => {
                    debug!("Scheduled redis-cleaner run skipped, guard is held");
                }
                Err(err) => {
                    error!(error = %err, "Error executing redis-cleaner");
                }
            }
        }

        warn!("redis-cleaner task terminated");
    })
}
