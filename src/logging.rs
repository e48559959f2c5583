//! Logging Module
//!
//! Leveled logging capability used by the cleanup pipeline, plus the
//! tracing subscriber setup for the binary.

use std::fmt;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// == Field ==
/// A key/value attribute attached to a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: &'static str,
    pub value: String,
}

/// Builds a [`Field`] from any displayable value.
pub fn field(key: &'static str, value: impl fmt::Display) -> Field {
    Field {
        key,
        value: value.to_string(),
    }
}

/// Renders fields as space separated `key=value` pairs.
struct Fields<'a>(&'a [Field]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", item.key, item.value)?;
        }
        Ok(())
    }
}

// == Logger ==
/// Structured, leveled logger handed to the cleaner.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str, fields: &[Field]);
    fn warn(&self, message: &str, fields: &[Field]);
    fn error(&self, message: &str, fields: &[Field]);
}

// == Tracing Logger ==
/// Forwards log lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str, fields: &[Field]) {
        tracing::info!(fields = %Fields(fields), "{}", message);
    }

    fn warn(&self, message: &str, fields: &[Field]) {
        tracing::warn!(fields = %Fields(fields), "{}", message);
    }

    fn error(&self, message: &str, fields: &[Field]) {
        tracing::error!(fields = %Fields(fields), "{}", message);
    }
}

// == Null Logger ==
/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn info(&self, _message: &str, _fields: &[Field]) {}
    fn warn(&self, _message: &str, _fields: &[Field]) {}
    fn error(&self, _message: &str, _fields: &[Field]) {}
}

// == Subscriber Setup ==
/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter` when set.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
