use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Broad category reported by a driver alongside its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DriverErrorKind {
    /// Establishing or keeping the connection failed.
    Connection,
    /// The statement itself was rejected (syntax, constraint, binding).
    Statement,
}

/// Structured error produced by a [`crate::driver::NativeHandle`].
///
/// Mirrors what native drivers usually expose: a category, an optional vendor code and two
/// messages (one from the client library, one from the server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub native_code: Option<String>,
    pub driver_text: String,
    pub database_text: String,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, driver_text: impl Into<String>) -> Self {
        Self {
            kind,
            native_code: None,
            driver_text: driver_text.into(),
            database_text: String::new(),
        }
    }

    pub fn connection(driver_text: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Connection, driver_text)
    }

    pub fn statement(driver_text: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Statement, driver_text)
    }

    #[must_use]
    pub fn with_native_code(mut self, code: impl Into<String>) -> Self {
        self.native_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_database_text(mut self, text: impl Into<String>) -> Self {
        self.database_text = text.into();
        self
    }

    /// Placeholder used when a handle reports closed without recording why.
    pub(crate) fn not_open() -> Self {
        Self::connection("connection is not open")
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.driver_text)?;
        if !self.database_text.is_empty() {
            write!(f, ": {}", self.database_text)?;
        }
        if let Some(code) = &self.native_code {
            write!(f, " (code {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for DriverError {}

/// Every failure the pool can report.
///
/// Query-time failures travel inside [`crate::QueryResult`] as data; construction-time failures
/// are returned as `Err` from the pool constructors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error("Connection error{}: {source}", throttle_note(.throttled))]
    Connection {
        source: DriverError,
        throttled: bool,
    },

    #[error("Query error: {0}")]
    Query(DriverError),

    #[error("Connection lost: {query}; probe failed: {probe}")]
    ConnectionLost { query: DriverError, probe: DriverError },

    #[error("Worker did not answer within {waited:?}")]
    Timeout { waited: Duration },

    #[error("Connection worker has shut down")]
    WorkerClosed,

    #[error("Failed to spawn connection worker: {0}")]
    Spawn(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn throttle_note(throttled: &bool) -> &'static str {
    if *throttled { " (reopen throttled)" } else { "" }
}

impl PoolError {
    /// True for failures caused by the connection rather than the statement.
    #[must_use]
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::ConnectionLost { .. })
    }

    /// The driver error that caused this failure, if one exists.
    #[must_use]
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::Connection { source, .. } => Some(source),
            Self::Query(err) => Some(err),
            Self::ConnectionLost { probe, .. } => Some(probe),
            _ => None,
        }
    }
}
