//! Error types for the cleaner
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error ==
/// Failure reported by a key-value store adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error returned by the Redis client
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Store could not serve the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// == Cleaner Error ==
/// Errors raised by the cleanup pipeline.
///
/// Only `Guard` ever leaves `Cleaner::run`; the others are logged by the
/// stage that hit them and turned into pipeline-wide cancellation.
#[derive(Error, Debug)]
pub enum CleanerError {
    /// Existence check on the guard key failed before any stage started
    #[error("failed to check run guard: {0}")]
    Guard(#[source] StoreError),

    /// Keyspace iteration failed
    #[error("failed to scan keys: {0}")]
    Scan(#[source] StoreError),

    /// TTL lookup failed for a candidate key
    #[error("failed to inspect TTL of {key}: {source}")]
    Inspect {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Bulk delete failed
    #[error("failed to delete batch of {keys} keys: {source}")]
    Delete {
        keys: usize,
        #[source]
        source: StoreError,
    },
}

// == Api Error ==
/// Errors returned by the admin HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request conflicts with the cleaner's current state
    #[error("Conflict: {0}")]
    Conflict(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Result type for store adapter calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
