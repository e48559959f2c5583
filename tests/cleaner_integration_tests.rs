//! Integration tests for the cleaner pipeline against the in-memory store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::{
    assert_keep_key_intact, remaining_long_keys, seed_keyspace, FaultyStore, Faults, Level,
    RecordingLogger, PATTERN,
};
use redis_cleaner::cleaner::{RunPhase, DEFAULT_GUARD_KEY};
use redis_cleaner::error::CleanerError;
use redis_cleaner::logging::NullLogger;
use redis_cleaner::store::{KeyValueStore, MemoryStore};
use redis_cleaner::{Cleaner, CleanupConfig, RunOutcome};

const SEEDED: usize = 1000;
const MIN_TTL_SECS: u64 = 120;
/// Delay before stopping a run against the slow store handle.
const STOP_AFTER: Duration = Duration::from_millis(15);
/// Per-call latency; a full run of `SEEDED` keys takes well over a second.
const SLOW_CALL: Duration = Duration::from_millis(1);

fn config() -> CleanupConfig {
    CleanupConfig::new(PATTERN, MIN_TTL_SECS).with_report(true)
}

fn faulty_cleaner(
    store: &MemoryStore,
    faults: Faults,
    config: CleanupConfig,
) -> (Cleaner, Arc<FaultyStore>, Arc<RecordingLogger>) {
    let faulty = Arc::new(FaultyStore::new(store.clone(), faults));
    let logger = Arc::new(RecordingLogger::default());
    let cleaner = Cleaner::new(faulty.clone(), logger.clone(), config);
    (cleaner, faulty, logger)
}

// == Full Run ==
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_run_deletes_every_long_ttl_key() {
    let store = MemoryStore::new();
    seed_keyspace(&store, SEEDED).await;
    let (cleaner, _, logger) = faulty_cleaner(&store, Faults::default(), config());

    let outcome = cleaner.run().await.unwrap();

    let report = outcome.report().expect("run should complete");
    assert_eq!(report.deleted_count, SEEDED as u64);
    assert_eq!(remaining_long_keys(&store).await, 0);
    assert_keep_key_intact(&store).await;
    assert!(!store.exists(DEFAULT_GUARD_KEY).await.unwrap());

    assert!(logger.has(Level::Info, "starting redis-cleaner..."));
    assert!(logger.has(Level::Info, "redis-cleaner stopped"));
    assert_eq!(
        logger.field("redis-cleaner report", "deleted_keys"),
        Some(SEEDED.to_string())
    );
    assert!(logger
        .field("redis-cleaner report", "duration_in_millis")
        .is_some());
}

#[tokio::test]
async fn test_report_disabled_logs_no_report() {
    let store = MemoryStore::new();
    seed_keyspace(&store, 20).await;
    let (cleaner, _, logger) =
        faulty_cleaner(&store, Faults::default(), config().with_report(false));

    let outcome = cleaner.run().await.unwrap();

    assert_eq!(outcome.report().map(|r| r.deleted_count), Some(20));
    assert!(logger.field("redis-cleaner report", "deleted_keys").is_none());
    assert!(logger.has(Level::Info, "redis-cleaner stopped"));
}

// == Batching ==
#[tokio::test]
async fn test_deletes_are_issued_in_full_batches() {
    let store = MemoryStore::new();
    seed_keyspace(&store, SEEDED).await;
    let (cleaner, faulty, _) = faulty_cleaner(&store, Faults::default(), config().with_batch_size(7));

    cleaner.run().await.unwrap();

    let batches = faulty.batches();
    let (last, full) = batches.split_last().expect("at least one batch");
    assert!(full.iter().all(|&size| size == 7));
    assert!(*last >= 1 && *last <= 7);
    assert_eq!(batches.iter().sum::<usize>(), SEEDED);
}

#[tokio::test]
async fn test_non_positive_batch_size_falls_back_to_default() {
    for requested in [0, -3] {
        let store = MemoryStore::new();
        seed_keyspace(&store, SEEDED).await;
        let (cleaner, faulty, _) =
            faulty_cleaner(&store, Faults::default(), config().with_batch_size(requested));

        cleaner.run().await.unwrap();

        let batches = faulty.batches();
        assert_eq!(batches.len(), SEEDED / 50);
        assert!(batches.iter().all(|&size| size == 50));
        assert_eq!(remaining_long_keys(&store).await, 0);
    }
}

// == Cancellation ==
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_mid_run_leaves_part_of_the_keyspace() {
    let store = MemoryStore::new();
    seed_keyspace(&store, SEEDED).await;
    let slow = store.handle_with_latency(SLOW_CALL);
    let cleaner = Arc::new(Cleaner::new(Arc::new(slow), Arc::new(NullLogger), config()));

    let running = tokio::spawn({
        let cleaner = cleaner.clone();
        async move { cleaner.run().await }
    });
    tokio::time::sleep(STOP_AFTER).await;
    cleaner.stop();

    let outcome = running.await.unwrap().unwrap();

    let remaining = remaining_long_keys(&store).await;
    assert!(remaining > 0, "stop did not halt the run");
    assert!(remaining < SEEDED, "nothing was deleted before stop");
    assert!(!store.exists("test:key:1").await.unwrap());
    assert_eq!(
        outcome.report().map(|r| r.deleted_count),
        Some((SEEDED - remaining) as u64)
    );
    assert_keep_key_intact(&store).await;
    assert!(!store.exists(DEFAULT_GUARD_KEY).await.unwrap());
    assert_eq!(cleaner.phase(), RunPhase::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_token_stops_run() {
    let store = MemoryStore::new();
    seed_keyspace(&store, SEEDED).await;
    let slow = store.handle_with_latency(SLOW_CALL);
    let cleaner = Arc::new(Cleaner::new(Arc::new(slow), Arc::new(NullLogger), config()));
    let shutdown = CancellationToken::new();

    let running = tokio::spawn({
        let cleaner = cleaner.clone();
        let shutdown = shutdown.clone();
        async move { cleaner.run_until(&shutdown).await }
    });
    tokio::time::sleep(STOP_AFTER).await;
    shutdown.cancel();

    running.await.unwrap().unwrap();

    let remaining = remaining_long_keys(&store).await;
    assert!(remaining > 0 && remaining < SEEDED);
    assert!(!store.exists(DEFAULT_GUARD_KEY).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_second_run_finishes_what_a_stopped_run_left() {
    let store = MemoryStore::new();
    seed_keyspace(&store, SEEDED).await;
    let slow = store.handle_with_latency(SLOW_CALL);
    let cleaner = Arc::new(Cleaner::new(Arc::new(slow), Arc::new(NullLogger), config()));

    let running = tokio::spawn({
        let cleaner = cleaner.clone();
        async move { cleaner.run().await }
    });
    tokio::time::sleep(STOP_AFTER).await;
    cleaner.stop();
    let first = running.await.unwrap().unwrap();

    let fast = Cleaner::new(Arc::new(store.clone()), Arc::new(NullLogger), config());
    let second = fast.run().await.unwrap();

    let deleted = first.report().map(|r| r.deleted_count).unwrap_or_default()
        + second.report().map(|r| r.deleted_count).unwrap_or_default();
    assert_eq!(deleted, SEEDED as u64);
    assert_eq!(remaining_long_keys(&store).await, 0);
    assert_keep_key_intact(&store).await;
}

// == Run Guard ==
#[tokio::test]
async fn test_held_guard_returns_already_running() {
    let store = MemoryStore::new();
    seed_keyspace(&store, 10).await;
    store.set(DEFAULT_GUARD_KEY, "1", None).await.unwrap();
    let (cleaner, faulty, logger) = faulty_cleaner(&store, Faults::default(), config());

    let outcome = cleaner.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::AlreadyRunning);
    assert!(logger.has(Level::Info, "redis-cleaner is already running"));
    assert!(faulty.batches().is_empty());
    assert_eq!(remaining_long_keys(&store).await, 10);
    assert!(store.exists(DEFAULT_GUARD_KEY).await.unwrap());
}

#[tokio::test]
async fn test_guard_check_failure_aborts_before_touching_keys() {
    let store = MemoryStore::new();
    seed_keyspace(&store, 10).await;
    let faults = Faults {
        exists: true,
        ..Faults::default()
    };
    let (cleaner, faulty, logger) = faulty_cleaner(&store, faults, config());

    let result = cleaner.run().await;

    assert!(matches!(result, Err(CleanerError::Guard(_))));
    assert!(logger.has(Level::Error, "error getting redis-cleaner running status"));
    assert!(faulty.batches().is_empty());
    assert_eq!(remaining_long_keys(&store).await, 10);
    assert!(!store.exists(DEFAULT_GUARD_KEY).await.unwrap());
}

#[tokio::test]
async fn test_guard_set_failure_still_runs() {
    let store = MemoryStore::new();
    seed_keyspace(&store, 10).await;
    let faults = Faults {
        set: true,
        ..Faults::default()
    };
    let (cleaner, _, logger) = faulty_cleaner(&store, faults, config());

    let outcome = cleaner.run().await.unwrap();

    assert_eq!(outcome.report().map(|r| r.deleted_count), Some(10));
    assert!(logger.has(Level::Error, "error setting redis-cleaner running status"));
    assert_eq!(remaining_long_keys(&store).await, 0);
}

// == Stage Failures ==
#[tokio::test]
async fn test_delete_failure_cancels_and_counts_submitted_keys() {
    let store = MemoryStore::new();
    seed_keyspace(&store, SEEDED).await;
    let faults = Faults {
        delete: true,
        ..Faults::default()
    };
    let (cleaner, _, logger) = faulty_cleaner(&store, faults, config());

    let outcome = cleaner.run().await.unwrap();

    let report = outcome.report().expect("run should complete");
    assert!(report.deleted_count >= 50);
    assert!(report.deleted_count < SEEDED as u64);
    assert!(logger.has(Level::Error, "error while redis-cleaner deleting keys"));
    assert_eq!(remaining_long_keys(&store).await, SEEDED);
    assert!(!store.exists(DEFAULT_GUARD_KEY).await.unwrap());
}

#[tokio::test]
async fn test_ttl_failure_deletes_nothing() {
    let store = MemoryStore::new();
    seed_keyspace(&store, 100).await;
    let faults = Faults {
        ttl: true,
        ..Faults::default()
    };
    let (cleaner, faulty, logger) = faulty_cleaner(&store, faults, config());

    let outcome = cleaner.run().await.unwrap();

    assert_eq!(outcome.report().map(|r| r.deleted_count), Some(0));
    assert!(logger.has(Level::Error, "error while redis-cleaner getting TTL"));
    assert!(faulty.batches().is_empty());
    assert_eq!(remaining_long_keys(&store).await, 100);
    assert!(!store.exists(DEFAULT_GUARD_KEY).await.unwrap());
}

#[tokio::test]
async fn test_scan_failure_keeps_keys_already_yielded() {
    let store = MemoryStore::new();
    seed_keyspace(&store, 100).await;
    let faults = Faults {
        scan_error_after: Some(10),
        ..Faults::default()
    };
    let (cleaner, _, logger) = faulty_cleaner(&store, faults, config());

    let outcome = cleaner.run().await.unwrap();

    assert_eq!(outcome.report().map(|r| r.deleted_count), Some(10));
    assert!(logger.has(Level::Error, "redis-cleaner error iterating over keys"));
    assert_eq!(remaining_long_keys(&store).await, 90);
    assert!(!store.exists(DEFAULT_GUARD_KEY).await.unwrap());
}
