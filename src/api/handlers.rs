//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

use crate::cleaner::{Cleaner, RunOutcome};
use crate::error::{ApiError, ApiResult};
use crate::models::{ActionResponse, HealthResponse, ReportResponse, StatusResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The cleaner driven by this service
    pub cleaner: Arc<Cleaner>,
}

impl AppState {
    /// Creates a new AppState around the given cleaner.
    pub fn new(cleaner: Arc<Cleaner>) -> Self {
        Self { cleaner }
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /cleaner
///
/// Returns the current phase, settings and last report.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::from_cleaner(&state.cleaner))
}

/// Handler for POST /cleaner/run
///
/// Claims the cleaner and drives the run in the background, so a stop sent
/// right after the 202 reaches this run. The fleet-wide guard still decides
/// whether the run actually does anything.
pub async fn run_handler(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<ActionResponse>)> {
    let Some(run) = state.cleaner.start() else {
        return Err(ApiError::Conflict(
            "redis-cleaner is already running".to_string(),
        ));
    };

    tokio::spawn(async move {
        match run.await {
            Ok(RunOutcome::Completed(report)) => {
                info!(deleted = report.deleted_count, "On-demand redis-cleaner run finished");
            }
            Ok(RunOutcome::AlreadyRunning) => {
                info!("On-demand redis-cleaner run skipped, guard is held");
            }
            Err(err) => error!(error = %err, "On-demand redis-cleaner run failed"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ActionResponse::new("redis-cleaner run started")),
    ))
}

/// Handler for POST /cleaner/stop
///
/// Signals the current run to drain and stop.
pub async fn stop_handler(State(state): State<AppState>) -> (StatusCode, Json<ActionResponse>) {
    state.cleaner.stop();
    (
        StatusCode::ACCEPTED,
        Json(ActionResponse::new("redis-cleaner stop requested")),
    )
}

/// Handler for GET /cleaner/report
pub async fn report_handler(State(state): State<AppState>) -> ApiResult<Json<ReportResponse>> {
    state
        .cleaner
        .last_report()
        .map(|report| Json(ReportResponse::from(&report)))
        .ok_or_else(|| ApiError::NotFound("no redis-cleaner run has completed yet".to_string()))
}
