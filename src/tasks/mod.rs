//! Background Tasks Module
//!
//! Contains background tasks that run periodically during service operation.
//!
//! # Tasks
//! - Redis cleaner: runs the TTL cleanup pipeline at configured intervals

mod cleanup;

pub use cleanup::spawn_cleaner_task;
