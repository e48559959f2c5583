//! Cleaner Module
//!
//! Removes keys whose TTL exceeds a threshold through a three-stage
//! pipeline: scan → TTL filter → batch delete.

mod config;
mod control;
mod coordinator;
mod deleter;
mod filter;
mod guard;
mod scanner;


// Re-export public types
pub use config::{CleanupConfig, DEFAULT_BATCH_SIZE, DEFAULT_GUARD_KEY};
pub use control::RunControl;
pub use coordinator::{Cleaner, PipelineReport, RunOutcome, RunPhase, HANDOFF_CAPACITY};
pub use deleter::BatchDeleter;
pub use filter::TtlFilter;
pub use guard::RunGuard;
pub use scanner::KeyScanner;
