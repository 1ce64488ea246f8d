//! Fixed-size pool of database connections where every connection is pinned to its own thread.
//!
//! Native handles are not safe to share between threads, so each one lives inside a worker
//! that owns a dedicated thread. Callers on any thread dispatch through [`Pool`], which picks a
//! worker round-robin and blocks until that worker replies. A worker whose connection drops
//! reopens it lazily, at most once per reopen interval.
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use sql_affinity_pool::prelude::*;
//!
//! # fn main() -> Result<(), PoolError> {
//! let pool = Pool::sqlite(4, "app.db")?;
//! pool.query("CREATE TABLE IF NOT EXISTS kv (k TEXT PRIMARY KEY, v INTEGER)").into_result()?;
//!
//! let mut args = BTreeMap::new();
//! args.insert("k".to_string(), Value::from("answer"));
//! args.insert("v".to_string(), Value::from(42));
//! let inserted = pool.query_named("INSERT INTO kv (k, v) VALUES (:k, :v)", args);
//! assert_eq!(inserted.rows_affected(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod registry;
pub mod results;
pub mod types;

mod worker;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::ConnectionConfig;
pub use error::{DriverError, PoolError};
pub use pool::{Pool, PoolBuilder};
pub use results::{QueryResult, Record};
pub use types::{DriverKind, Params, Value};
