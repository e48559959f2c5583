//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, report_handler, run_handler, status_handler, stop_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /cleaner` - Phase, settings and last report
/// - `POST /cleaner/run` - Start a run in the background
/// - `POST /cleaner/stop` - Stop the current run
/// - `GET /cleaner/report` - Report of the last finished run
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cleaner", get(status_handler))
        .route("/cleaner/run", post(run_handler))
        .route("/cleaner/stop", post(stop_handler))
        .route("/cleaner/report", get(report_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
