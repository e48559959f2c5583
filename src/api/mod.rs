//! API Module
//!
//! HTTP handlers and routing for the cleaner's admin API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cleaner` - Cleaner status
//! - `POST /cleaner/run` - Start a run
//! - `POST /cleaner/stop` - Stop the current run
//! - `GET /cleaner/report` - Last run report

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
