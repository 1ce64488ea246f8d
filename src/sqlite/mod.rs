// SQLite driver backed by rusqlite.
//
// - config: pool constructors for SQLite
// - driver: Driver/NativeHandle implementations
// - params: value conversion and parameter binding
// - query: statement execution and row extraction

pub mod config;
pub mod driver;
pub mod params;
pub mod query;

pub use driver::{SqliteDriver, SqliteHandle};
