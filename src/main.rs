//! Redis Cleaner - Background janitor for over-long TTLs
//!
//! Runs the cleaner on a schedule and exposes a small admin API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use redis_cleaner::api::create_router;
use redis_cleaner::logging::{init_tracing, Logger, TracingLogger};
use redis_cleaner::store::{KeyValueStore, RedisStore};
use redis_cleaner::{spawn_cleaner_task, AppState, Cleaner, Config};

/// Main entry point for the Redis cleaner service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to Redis
/// 4. Start the scheduled cleaner task
/// 5. Create Axum router with the admin endpoints
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM, stop the schedule and let the current run drain
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    init_tracing("redis_cleaner=info,tower_http=info");

    info!("Starting Redis Cleaner");

    let config = Config::from_env();
    info!(
        "Configuration loaded: pattern={}, min_ttl={}s, batch_size={}, interval={}s, port={}",
        config.cleanup.key_pattern(),
        config.cleanup.min_ttl_secs(),
        config.cleanup.batch_size(),
        config.cleaner_interval,
        config.server_port
    );

    let store: Arc<dyn KeyValueStore> = Arc::new(
        RedisStore::connect(&config.redis_url)
            .await
            .with_context(|| format!("failed to connect to {}", config.redis_url))?
            .with_scan_count(config.redis_scan_count),
    );
    info!("Connected to Redis");

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
    let cleaner = Arc::new(Cleaner::new(store, logger, config.cleanup.clone()));

    let shutdown = CancellationToken::new();
    let cleaner_handle =
        spawn_cleaner_task(cleaner.clone(), config.cleaner_interval, shutdown.clone());
    info!("Background cleaner task started");

    let app = create_router(AppState::new(cleaner));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("server error")?;

    if let Err(err) = cleaner_handle.await {
        warn!(error = %err, "Cleaner task ended abnormally");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, cancels `shutdown` so the cleaner task stops
/// scheduling and any in-flight run drains and releases its guard.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    shutdown.cancel();
    warn!("Cleaner schedule cancelled");
}
