//! Redis Cleaner - Background janitor for over-long TTLs
//!
//! Scans a Redis keyspace, finds keys whose remaining TTL is above a
//! threshold and deletes them in batches, once per fleet at a time.

pub mod api;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cleaner::{Cleaner, CleanupConfig, PipelineReport, RunOutcome};
pub use config::Config;
pub use tasks::spawn_cleaner_task;
