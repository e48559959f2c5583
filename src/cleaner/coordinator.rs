//! Pipeline Coordinator
//!
//! Runs the scan → TTL filter → batch delete pipeline under the fleet-wide
//! run guard and reports on the result.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cleaner::{BatchDeleter, CleanupConfig, KeyScanner, RunControl, RunGuard, TtlFilter};
use crate::error::CleanerError;
use crate::logging::{field, Logger};
use crate::store::KeyValueStore;

/// Capacity of each handoff channel between stages. tokio has no
/// zero-capacity channel, so each stream holds at most one key in flight
/// besides the one the receiving stage is working on.
pub const HANDOFF_CAPACITY: usize = 1;

// == Run Phase ==
/// Lifecycle of a cleaner run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Idle,
    Acquiring,
    Running,
    Draining,
    Stopped,
}

impl RunPhase {
    /// True while a run started by this cleaner has not finished.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunPhase::Acquiring | RunPhase::Running | RunPhase::Draining
        )
    }
}

// == Pipeline Report ==
/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Keys submitted to bulk deletes, including batches whose call failed
    pub deleted_count: u64,
    pub elapsed: Duration,
    pub finished_at: DateTime<Utc>,
}

// == Run Outcome ==
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Another run holds the guard; nothing was touched
    AlreadyRunning,
    Completed(PipelineReport),
}

impl RunOutcome {
    pub fn report(&self) -> Option<&PipelineReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::AlreadyRunning => None,
        }
    }
}

/// Mutable bookkeeping owned by the cleaner between runs.
struct RunSlot {
    phase: RunPhase,
    /// Bumped by every claim
    generation: u64,
    cancel: CancellationToken,
    last_report: Option<PipelineReport>,
}

// == Run Claim ==
/// Ownership of the slot by one run. Dropping an unfinished claim puts the
/// slot back to `Stopped` so later runs are not locked out.
struct RunClaim {
    slot: Arc<Mutex<RunSlot>>,
    generation: u64,
    cancel: CancellationToken,
    started: Instant,
}

impl Drop for RunClaim {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.generation == self.generation && slot.phase.is_active() {
            slot.phase = RunPhase::Stopped;
        }
    }
}

// == Cleaner ==
pub struct Cleaner {
    store: Arc<dyn KeyValueStore>,
    logger: Arc<dyn Logger>,
    config: CleanupConfig,
    guard: RunGuard,
    slot: Arc<Mutex<RunSlot>>,
}

impl Cleaner {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        logger: Arc<dyn Logger>,
        config: CleanupConfig,
    ) -> Self {
        let guard = RunGuard::new(store.clone(), logger.clone(), config.guard_key());
        Self {
            store,
            logger,
            config,
            guard,
            slot: Arc::new(Mutex::new(RunSlot {
                phase: RunPhase::Idle,
                generation: 0,
                cancel: CancellationToken::new(),
                last_report: None,
            })),
        }
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.slot.lock().phase
    }

    pub fn last_report(&self) -> Option<PipelineReport> {
        self.slot.lock().last_report.clone()
    }

    /// Runs the pipeline once.
    ///
    /// Returns `AlreadyRunning` when the guard is held elsewhere and
    /// `CleanerError::Guard` when the guard cannot be checked. Failures after
    /// the stages start are logged, cancel the run and never surface here.
    ///
    /// The future may be dropped at any point, e.g. under a timeout: the
    /// stages are cancelled, the guard is released once they have drained
    /// and the cleaner can run again.
    pub async fn run(&self) -> Result<RunOutcome, CleanerError> {
        match self.claim(CancellationToken::new()) {
            Some(claim) => self.execute(claim).await,
            None => Ok(self.already_active()),
        }
    }

    /// Like [`Cleaner::run`], but cancelling `shutdown` stops the run the
    /// same way [`Cleaner::stop`] does.
    pub async fn run_until(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<RunOutcome, CleanerError> {
        match self.claim(shutdown.child_token()) {
            Some(claim) => self.execute(claim).await,
            None => Ok(self.already_active()),
        }
    }

    /// Claims the cleaner immediately and returns the run to drive, or `None`
    /// if a run is already active. A [`Cleaner::stop`] issued after this
    /// returns reaches the run even before the future is first polled.
    pub fn start(
        self: &Arc<Self>,
    ) -> Option<impl Future<Output = Result<RunOutcome, CleanerError>> + Send + 'static> {
        let claim = self.claim(CancellationToken::new())?;
        let cleaner = Arc::clone(self);
        Some(async move { cleaner.execute(claim).await })
    }

    /// Asks the current run to wind down. The scanner stops producing and the
    /// remaining stages drain what is already in flight.
    pub fn stop(&self) {
        let mut slot = self.slot.lock();
        slot.cancel.cancel();
        if slot.phase == RunPhase::Running {
            slot.phase = RunPhase::Draining;
        }
    }

    async fn execute(&self, claim: RunClaim) -> Result<RunOutcome, CleanerError> {
        match self.guard.try_acquire().await {
            Ok(true) => {}
            Ok(false) => {
                self.logger.info(
                    "redis-cleaner is already running",
                    &[field("guard_key", self.guard.key())],
                );
                self.set_phase(RunPhase::Stopped);
                return Ok(RunOutcome::AlreadyRunning);
            }
            Err(source) => {
                self.logger.error(
                    "error getting redis-cleaner running status",
                    &[field("guard_key", self.guard.key()), field("error", &source)],
                );
                self.set_phase(RunPhase::Stopped);
                return Err(CleanerError::Guard(source));
            }
        }

        let mut release = PendingRelease::arm(self.guard.clone(), self.logger.clone());
        let _cancel_on_exit = claim.cancel.clone().drop_guard();
        self.enter_running();

        self.logger.info(
            "starting redis-cleaner...",
            &[
                field("key_pattern", self.config.key_pattern()),
                field("min_ttl_secs", self.config.min_ttl_secs()),
                field("batch_size", self.config.batch_size()),
            ],
        );

        let control = Arc::new(RunControl::new(claim.cancel.clone()));
        release.stages = self.spawn_stages(&control);
        release.join_stages().await;

        control.cancel();
        self.set_phase(RunPhase::Draining);
        release.release().await;

        let elapsed = claim.started.elapsed();
        let report = PipelineReport {
            deleted_count: control.deleted(),
            elapsed,
            finished_at: Utc::now(),
        };
        if self.config.report_enabled() {
            self.logger.info(
                "redis-cleaner report",
                &[
                    field("deleted_keys", report.deleted_count),
                    field("duration_in_millis", elapsed.as_millis()),
                ],
            );
        }
        self.logger.info("redis-cleaner stopped", &[]);

        {
            let mut slot = self.slot.lock();
            slot.phase = RunPhase::Stopped;
            slot.last_report = Some(report.clone());
        }
        Ok(RunOutcome::Completed(report))
    }

    /// Spawns the three stages wired together by handoff channels.
    fn spawn_stages(&self, control: &Arc<RunControl>) -> Vec<(&'static str, JoinHandle<()>)> {
        let (candidate_tx, candidate_rx) = mpsc::channel(HANDOFF_CAPACITY);
        let (match_tx, match_rx) = mpsc::channel(HANDOFF_CAPACITY);

        let scanner = KeyScanner::new(
            self.store.clone(),
            self.logger.clone(),
            self.config.key_pattern(),
        );
        let filter = TtlFilter::new(
            self.store.clone(),
            self.logger.clone(),
            self.config.min_ttl(),
        );
        let deleter = BatchDeleter::new(
            self.store.clone(),
            self.logger.clone(),
            self.config.batch_size(),
        );

        vec![
            ("scanner", tokio::spawn(scanner.run(control.clone(), candidate_tx))),
            ("filter", tokio::spawn(filter.run(control.clone(), candidate_rx, match_tx))),
            ("deleter", tokio::spawn(deleter.run(control.clone(), match_rx))),
        ]
    }

    /// Claims the slot for a new run; `None` if this cleaner is mid-run.
    fn claim(&self, cancel: CancellationToken) -> Option<RunClaim> {
        let mut slot = self.slot.lock();
        if slot.phase.is_active() {
            return None;
        }
        slot.phase = RunPhase::Acquiring;
        slot.generation += 1;
        slot.cancel = cancel.clone();
        Some(RunClaim {
            slot: Arc::clone(&self.slot),
            generation: slot.generation,
            cancel,
            started: Instant::now(),
        })
    }

    fn already_active(&self) -> RunOutcome {
        self.logger.info("redis-cleaner is already running", &[]);
        RunOutcome::AlreadyRunning
    }

    /// Moves to `Running` unless a stop already arrived while acquiring.
    fn enter_running(&self) {
        let mut slot = self.slot.lock();
        slot.phase = if slot.cancel.is_cancelled() {
            RunPhase::Draining
        } else {
            RunPhase::Running
        };
    }

    fn set_phase(&self, phase: RunPhase) {
        self.slot.lock().phase = phase;
    }
}

// == Pending Release ==
/// Guard release owed by an acquired run, ordered after its stages. If the
/// run future is dropped first, joining and releasing move to a spawned task.
struct PendingRelease {
    guard: Option<RunGuard>,
    logger: Arc<dyn Logger>,
    /// Stage tasks not yet joined
    stages: Vec<(&'static str, JoinHandle<()>)>,
}

impl PendingRelease {
    fn arm(guard: RunGuard, logger: Arc<dyn Logger>) -> Self {
        Self {
            guard: Some(guard),
            logger,
            stages: Vec::new(),
        }
    }

    /// Waits for every stage in order, logging any that panicked.
    async fn join_stages(&mut self) {
        while let Some((stage, handle)) = self.stages.first_mut() {
            let stage = *stage;
            let joined = handle.await;
            self.stages.remove(0);
            if let Err(err) = joined {
                self.logger.error(
                    "redis-cleaner stage failed",
                    &[field("stage", stage), field("error", err)],
                );
            }
        }
    }

    async fn release(mut self) {
        self.join_stages().await;
        if let Some(guard) = self.guard.take() {
            release_guard(&guard, self.logger.as_ref()).await;
        }
    }
}

impl Drop for PendingRelease {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let logger = self.logger.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let mut stages = PendingRelease {
                    guard: None,
                    logger,
                    stages: std::mem::take(&mut self.stages),
                };
                handle.spawn(async move {
                    stages.join_stages().await;
                    release_guard(&guard, stages.logger.as_ref()).await;
                });
            }
            Err(_) => logger.warn(
                "redis-cleaner guard left in place, no runtime to release it",
                &[field("guard_key", guard.key())],
            ),
        }
    }
}

async fn release_guard(guard: &RunGuard, logger: &dyn Logger) {
    if let Err(err) = guard.release().await {
        logger.error(
            "error releasing redis-cleaner running status",
            &[field("guard_key", guard.key()), field("error", err)],
        );
    }
}
