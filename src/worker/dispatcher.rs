use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::driver::{Driver, NativeHandle};
use crate::error::{DriverError, PoolError};
use crate::registry::HandleRegistry;
use crate::results::QueryResult;
use crate::types::{Params, QueryRequest};

use super::channel::Command;

/// Handle plus the registry name it was created under.
struct OwnedHandle {
    name: String,
    native: Box<dyn NativeHandle>,
}

/// Per-worker connection state. Lives on, and never leaves, the worker thread.
pub(super) struct ConnectionState {
    index: usize,
    config: Arc<ConnectionConfig>,
    driver: Arc<dyn Driver>,
    registry: Arc<HandleRegistry>,
    handle: Option<OwnedHandle>,
    last_open_attempt: Option<Instant>,
}

impl ConnectionState {
    pub(super) fn new(
        index: usize,
        config: Arc<ConnectionConfig>,
        driver: Arc<dyn Driver>,
        registry: Arc<HandleRegistry>,
    ) -> Self {
        Self {
            index,
            config,
            driver,
            registry,
            handle: None,
            last_open_attempt: None,
        }
    }

    pub(super) fn execute(&mut self, request: &QueryRequest) -> QueryResult {
        match self.check_connection() {
            Ok(()) => self.do_query(request),
            Err(err) => QueryResult::failed(err),
        }
    }

    /// Make sure an open handle exists, reopening at most once per reopen interval.
    fn check_connection(&mut self) -> Result<(), PoolError> {
        if self.handle.is_none() {
            self.handle = Some(self.create_handle()?);
        }
        let Some(handle) = self.handle.as_mut() else {
            return Err(PoolError::Connection {
                source: DriverError::not_open(),
                throttled: false,
            });
        };

        if handle.native.is_open() {
            return Ok(());
        }

        let cause = handle.native.last_error().unwrap_or_else(DriverError::not_open);
        let now = Instant::now();
        if let Some(last) = self.last_open_attempt {
            let since = now.duration_since(last);
            if since < self.config.auto_reopen_interval {
                warn!(
                    worker = self.index,
                    handle = %handle.name,
                    since_last_attempt = ?since,
                    "connection closed; reopen throttled"
                );
                return Err(PoolError::Connection {
                    source: cause,
                    throttled: true,
                });
            }
        }

        self.last_open_attempt = Some(now);
        debug!(worker = self.index, handle = %handle.name, "opening connection");
        match handle.native.open() {
            Ok(()) => {
                info!(worker = self.index, handle = %handle.name, "connection opened");
                Ok(())
            }
            Err(err) => {
                warn!(worker = self.index, handle = %handle.name, error = %err, "open failed");
                self.teardown();
                Err(PoolError::Connection {
                    source: err,
                    throttled: false,
                })
            }
        }
    }

    fn create_handle(&self) -> Result<OwnedHandle, PoolError> {
        let name = self.registry.register(self.config.kind);
        match self.driver.create_handle(&name, &self.config) {
            Ok(native) => {
                debug!(worker = self.index, handle = %name, "handle created");
                Ok(OwnedHandle { name, native })
            }
            Err(err) => {
                self.registry.deregister(&name);
                warn!(worker = self.index, error = %err, "driver refused to create a handle");
                Err(PoolError::Connection {
                    source: err,
                    throttled: false,
                })
            }
        }
    }

    fn do_query(&mut self, request: &QueryRequest) -> QueryResult {
        let probe = self.config.kind.probe_statement();
        let Some(handle) = self.handle.as_mut() else {
            return QueryResult::failed(PoolError::Connection {
                source: DriverError::not_open(),
                throttled: false,
            });
        };

        let query_err = match handle.native.execute(&request.sql, &request.params) {
            Ok(output) => return QueryResult::from_output(output),
            Err(err) => err,
        };

        // The probe tells a bad statement apart from a dead connection.
        match handle.native.execute(probe, &Params::None) {
            Ok(_) => {
                debug!(worker = self.index, error = %query_err, "statement failed");
                QueryResult::failed(PoolError::Query(query_err))
            }
            Err(probe_err) => {
                warn!(
                    worker = self.index,
                    handle = %handle.name,
                    error = %query_err,
                    probe_error = %probe_err,
                    "connection lost; tearing handle down"
                );
                self.teardown();
                QueryResult::failed(PoolError::ConnectionLost {
                    query: query_err,
                    probe: probe_err,
                })
            }
        }
    }

    /// Close, drop and deregister the current handle, if any.
    fn teardown(&mut self) {
        if let Some(OwnedHandle { name, mut native }) = self.handle.take() {
            native.close();
            drop(native);
            self.registry.deregister(&name);
            debug!(worker = self.index, handle = %name, "handle released");
        }
    }
}

impl Drop for ConnectionState {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub(super) fn run_worker(mut state: ConnectionState, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::Execute {
                request,
                respond_to,
            } => {
                let result = state.execute(&request);
                if !respond_to.send(result) {
                    debug!(worker = state.index, "caller stopped waiting; result discarded");
                }
            }
        }
    }
    debug!(worker = state.index, "worker loop exiting");
}
