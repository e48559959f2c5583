//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cleaner::{Cleaner, PipelineReport, RunPhase};

/// Report of the last finished run (GET /cleaner/report)
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    /// Keys submitted for deletion, an upper bound on keys actually removed
    pub deleted_count: u64,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
    /// Completion time in RFC 3339 format
    pub finished_at: String,
}

impl From<&PipelineReport> for ReportResponse {
    fn from(report: &PipelineReport) -> Self {
        Self {
            deleted_count: report.deleted_count,
            duration_ms: report.elapsed.as_millis() as u64,
            finished_at: report.finished_at.to_rfc3339(),
        }
    }
}

/// Cleaner state and settings (GET /cleaner)
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub phase: RunPhase,
    pub key_pattern: String,
    pub min_ttl_secs: u64,
    pub batch_size: usize,
    pub last_report: Option<ReportResponse>,
}

impl StatusResponse {
    /// Snapshots the cleaner's current phase, configuration and last report
    pub fn from_cleaner(cleaner: &Cleaner) -> Self {
        let config = cleaner.config();
        Self {
            phase: cleaner.phase(),
            key_pattern: config.key_pattern().to_string(),
            min_ttl_secs: config.min_ttl_secs(),
            batch_size: config.batch_size(),
            last_report: cleaner.last_report().as_ref().map(ReportResponse::from),
        }
    }
}

/// Acknowledgement for run and stop requests (POST /cleaner/run, /cleaner/stop)
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
