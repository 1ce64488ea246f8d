use crate::config::{ConnectionConfig, ConnectionConfigBuilder};
use crate::error::PoolError;
use crate::pool::Pool;
use crate::types::DriverKind;

use super::driver::SqliteDriver;

impl ConnectionConfig {
    /// Builder preset for an SQLite database file at `path`.
    #[must_use]
    pub fn sqlite_builder(path: impl Into<String>) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new(DriverKind::Sqlite).database_name(path)
    }
}

impl Pool {
    /// Pool of `num_connections` SQLite connections to the file at `path`, with default settings.
    ///
    /// # Errors
    /// Returns [`PoolError::Config`] for a zero-sized pool or [`PoolError::Spawn`] if a worker
    /// thread cannot start.
    pub fn sqlite(num_connections: usize, path: impl Into<String>) -> Result<Self, PoolError> {
        let config = ConnectionConfig::sqlite_builder(path).finish()?;
        Pool::new(num_connections, config, SqliteDriver::new())
    }
}
