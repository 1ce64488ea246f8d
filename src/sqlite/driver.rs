use std::time::Duration;

use rusqlite::Connection;
use tracing::warn;

use crate::config::ConnectionConfig;
use crate::driver::{Driver, NativeHandle, StatementOutput};
use crate::error::DriverError;
use crate::types::{DriverKind, Params};

use super::query::{connection_error, run_statement};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates rusqlite-backed handles. `database_name` is the file path; an empty name or
/// `:memory:` opens a private in-memory database per handle.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    busy_timeout: Duration,
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl SqliteDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How long a statement waits on a locked database file before failing with `SQLITE_BUSY`.
    #[must_use]
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

impl Driver for SqliteDriver {
    fn create_handle(
        &self,
        name: &str,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn NativeHandle>, DriverError> {
        Ok(Box::new(SqliteHandle {
            name: name.to_string(),
            path: config.database_name.clone(),
            busy_timeout: self.busy_timeout,
            conn: None,
            last_error: None,
        }))
    }

    fn supports(&self, kind: DriverKind) -> bool {
        kind == DriverKind::Sqlite
    }
}

/// One rusqlite connection, opened lazily by its worker.
pub struct SqliteHandle {
    name: String,
    path: String,
    busy_timeout: Duration,
    conn: Option<Connection>,
    last_error: Option<DriverError>,
}

impl SqliteHandle {
    fn connect(&self) -> Result<Connection, rusqlite::Error> {
        let conn = if self.path.is_empty() || self.path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&self.path)?
        };
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

impl NativeHandle for SqliteHandle {
    fn open(&mut self) -> Result<(), DriverError> {
        if self.conn.is_some() {
            return Ok(());
        }
        match self.connect() {
            Ok(conn) => {
                self.conn = Some(conn);
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                let err = connection_error(err);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn last_error(&self) -> Option<DriverError> {
        self.last_error.clone()
    }

    fn execute(&mut self, sql: &str, params: &Params) -> Result<StatementOutput, DriverError> {
        let Some(conn) = self.conn.as_ref() else {
            return Err(DriverError::not_open());
        };
        let outcome = run_statement(conn, sql, params);
        if let Err(err) = &outcome {
            self.last_error = Some(err.clone());
        }
        outcome
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, err)) = conn.close() {
                warn!(handle = %self.name, error = %err, "sqlite close failed");
            }
        }
    }
}
