use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use sql_affinity_pool::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive a thread-pinned SQLite pool from several caller threads")]
pub(crate) struct Args {
    /// SQLite database file; defaults to a private in-memory database per connection.
    #[arg(long, default_value = "")]
    pub(crate) database: String,
    #[arg(long, default_value_t = 4)]
    pub(crate) connections: usize,
    #[arg(long, default_value_t = 3)]
    pub(crate) threads: usize,
    #[arg(long, default_value_t = 3000)]
    pub(crate) iterations: usize,
    #[arg(long, default_value = "SELECT * FROM test")]
    pub(crate) sql: String,
    #[arg(long, default_value_t = 10_000)]
    pub(crate) reopen_interval_ms: u64,
    /// Upper bound on a single call; omit to wait indefinitely.
    #[arg(long)]
    pub(crate) timeout_ms: Option<u64>,
    /// Rows inserted into `test` on every connection before the run.
    #[arg(long, default_value_t = 3)]
    pub(crate) seed_rows: usize,
    /// Log at debug level, including each returned row.
    #[arg(long)]
    pub(crate) verbose: bool,
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DemoConfig {
    pub(crate) database: String,
    pub(crate) connections: usize,
    pub(crate) threads: usize,
    pub(crate) iterations: usize,
    pub(crate) sql: String,
    pub(crate) reopen_interval_ms: u64,
    pub(crate) timeout_ms: Option<u64>,
    pub(crate) seed_rows: usize,
    pub(crate) verbose: bool,
    pub(crate) log: Option<PathBuf>,
}

impl DemoConfig {
    pub(crate) fn from_args(args: Args) -> Self {
        Self {
            database: args.database,
            connections: args.connections,
            threads: args.threads.max(1),
            iterations: args.iterations,
            sql: args.sql,
            reopen_interval_ms: args.reopen_interval_ms,
            timeout_ms: args.timeout_ms,
            seed_rows: args.seed_rows,
            verbose: args.verbose,
            log: args.log,
        }
    }

    pub(crate) fn connection_config(&self) -> Result<ConnectionConfig, PoolError> {
        ConnectionConfig::sqlite_builder(self.database.clone())
            .auto_reopen_interval(Duration::from_millis(self.reopen_interval_ms))
            .call_timeout(self.timeout_ms.map(Duration::from_millis))
            .finish()
    }
}
