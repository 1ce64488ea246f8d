use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::driver::Driver;
use crate::error::PoolError;
use crate::registry::HandleRegistry;
use crate::results::QueryResult;
use crate::types::{DriverKind, Params, QueryRequest, Value};
use crate::worker::ConnectionWorker;

/// Fixed-size pool of thread-pinned connections with round-robin dispatch.
///
/// ```rust,no_run
/// use sql_affinity_pool::prelude::*;
///
/// # fn main() -> Result<(), PoolError> {
/// let pool = Pool::sqlite(4, "app.db")?;
/// let result = pool.query_positional("SELECT name FROM users WHERE id = ?", vec![Value::from(5)]);
/// for record in result.into_result()?.records() {
///     println!("{:?}", record.get("name"));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pool {
    config: Arc<ConnectionConfig>,
    workers: Vec<ConnectionWorker>,
    counter: AtomicUsize,
    registry: Arc<HandleRegistry>,
}

impl Pool {
    /// Start `num_connections` workers sharing `config`.
    ///
    /// # Errors
    /// Returns [`PoolError::Config`] when `num_connections` is zero, the driver does not support
    /// `config.kind`, or the config is invalid; [`PoolError::Spawn`] if a worker cannot start.
    pub fn new(
        num_connections: usize,
        config: ConnectionConfig,
        driver: impl Driver,
    ) -> Result<Self, PoolError> {
        PoolBuilder::new(config)
            .connections(num_connections)
            .build(driver)
    }

    #[must_use]
    pub fn builder(config: ConnectionConfig) -> PoolBuilder {
        PoolBuilder::new(config)
    }

    /// Run `sql` without arguments.
    pub fn query(&self, sql: impl Into<String>) -> QueryResult {
        self.query_with(sql, Params::None)
    }

    /// Run `sql` binding `args` by position.
    pub fn query_positional(&self, sql: impl Into<String>, args: Vec<Value>) -> QueryResult {
        self.query_with(sql, Params::Positional(args))
    }

    /// Run `sql` binding `args` by placeholder name.
    pub fn query_named(
        &self,
        sql: impl Into<String>,
        args: BTreeMap<String, Value>,
    ) -> QueryResult {
        self.query_with(sql, Params::Named(args))
    }

    /// Run `sql` on the next worker in round-robin order and wait for its result.
    pub fn query_with(&self, sql: impl Into<String>, params: Params) -> QueryResult {
        self.next_worker()
            .execute(QueryRequest::new(sql, params))
    }

    /// Async variant of [`Pool::query_with`]. Needs a Tokio runtime with the time driver enabled
    /// when a call timeout is configured.
    pub async fn query_async(&self, sql: impl Into<String>, params: Params) -> QueryResult {
        let request = QueryRequest::new(sql, params);
        self.next_worker().execute_async(request).await
    }

    fn next_worker(&self) -> &ConnectionWorker {
        // fetch_add wraps on overflow; the modulo keeps the index in range.
        let slot = self.counter.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        debug!(worker = slot, "dispatching query");
        &self.workers[slot]
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[must_use]
    pub fn kind(&self) -> DriverKind {
        self.config.kind
    }

    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.config.database_name
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.config.user_name
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.config.password
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.config.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.config.port
    }

    #[must_use]
    pub fn auto_reopen_interval(&self) -> Duration {
        self.config.auto_reopen_interval
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        debug!(size = self.workers.len(), "shutting down pool");
        // Signal every worker before joining any, so they drain in parallel.
        for worker in &self.workers {
            worker.request_shutdown();
        }
        self.workers.clear();
    }
}

/// Builder for [`Pool`] when more than the defaults are needed.
#[derive(Debug)]
pub struct PoolBuilder {
    config: ConnectionConfig,
    connections: usize,
    registry: Option<Arc<HandleRegistry>>,
}

impl PoolBuilder {
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            connections: 1,
            registry: None,
        }
    }

    #[must_use]
    pub fn connections(mut self, num_connections: usize) -> Self {
        self.connections = num_connections;
        self
    }

    /// Use a private handle registry instead of the process-wide one.
    #[must_use]
    pub fn registry(mut self, registry: Arc<HandleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate the settings and start every worker.
    ///
    /// # Errors
    /// See [`Pool::new`].
    pub fn build(self, driver: impl Driver) -> Result<Pool, PoolError> {
        if self.connections == 0 {
            return Err(PoolError::Config(
                "a pool needs at least one connection".into(),
            ));
        }
        if !driver.supports(self.config.kind) {
            return Err(PoolError::Config(format!(
                "driver does not support {} connections",
                self.config.kind
            )));
        }
        self.config.validate()?;

        let config = Arc::new(self.config);
        let driver: Arc<dyn Driver> = Arc::new(driver);
        let registry = self.registry.unwrap_or_else(HandleRegistry::global);

        let workers = (0..self.connections)
            .map(|index| {
                ConnectionWorker::spawn(
                    index,
                    Arc::clone(&config),
                    Arc::clone(&driver),
                    Arc::clone(&registry),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            size = workers.len(),
            kind = %config.kind,
            database = %config.database_name,
            host = %config.host,
            "connection pool started"
        );

        Ok(Pool {
            config,
            workers,
            counter: AtomicUsize::new(0),
            registry,
        })
    }
}
