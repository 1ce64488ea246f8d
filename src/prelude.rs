//! Convenient imports for common functionality.

pub use crate::config::{ConnectionConfig, ConnectionConfigBuilder};
pub use crate::driver::{Driver, NativeHandle, StatementOutput};
pub use crate::error::{DriverError, DriverErrorKind, PoolError};
pub use crate::pool::{Pool, PoolBuilder};
pub use crate::registry::HandleRegistry;
pub use crate::results::{QueryResult, Record};
pub use crate::types::{DriverKind, Params, QueryRequest, Value};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteDriver;
