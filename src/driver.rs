//! Seam between the pool and a native database client.
//!
//! A [`Driver`] is shared by every worker and only builds handles. Each [`NativeHandle`] is
//! created on, used from, and dropped by exactly one worker thread, so it does not need to be
//! `Send` or `Sync`.

use crate::config::ConnectionConfig;
use crate::error::DriverError;
use crate::types::{DriverKind, Params, Value};

/// Factory for native connection handles.
pub trait Driver: Send + Sync + 'static {
    /// Create a handle registered under `name`. The handle must not be opened yet.
    ///
    /// # Errors
    /// Returns a [`DriverError`] when the driver cannot produce a handle for this config.
    fn create_handle(
        &self,
        name: &str,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn NativeHandle>, DriverError>;

    /// Whether this driver can serve connections of `kind`.
    fn supports(&self, _kind: DriverKind) -> bool {
        true
    }
}

/// A single native connection. Not thread-safe; owned by one worker thread.
pub trait NativeHandle {
    /// Establish the connection.
    ///
    /// # Errors
    /// Returns the driver's reason when the connection cannot be established.
    fn open(&mut self) -> Result<(), DriverError>;

    fn is_open(&self) -> bool;

    /// Most recent error recorded by the handle, if any.
    fn last_error(&self) -> Option<DriverError>;

    /// Prepare `sql`, bind `params`, execute it and drain every row.
    ///
    /// # Errors
    /// Returns the driver error for a failed prepare, bind or execute.
    fn execute(&mut self, sql: &str, params: &Params) -> Result<StatementOutput, DriverError>;

    /// Release the native connection. Called on the owning thread before the handle is dropped.
    fn close(&mut self) {}
}

/// Everything a handle produces for one successful statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub last_insert_id: Option<Value>,
    /// `None` when the driver cannot report a count for this statement.
    pub rows_affected: Option<i64>,
}
