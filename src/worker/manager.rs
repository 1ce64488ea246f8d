use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::config::ConnectionConfig;
use crate::driver::Driver;
use crate::error::PoolError;
use crate::registry::HandleRegistry;
use crate::results::QueryResult;
use crate::types::QueryRequest;

use super::channel::{Command, Responder};
use super::dispatcher::{ConnectionState, run_worker};

/// One native connection pinned to its own thread.
///
/// Callers on any thread hand requests over a channel and wait for the reply; the handle itself
/// is only ever touched by the worker thread.
pub struct ConnectionWorker {
    index: usize,
    sender: Sender<Command>,
    call_timeout: Option<Duration>,
    thread: Option<JoinHandle<()>>,
}

impl ConnectionWorker {
    /// Start the worker thread and wait until its loop is accepting requests.
    ///
    /// # Errors
    /// Returns [`PoolError::Spawn`] if the thread cannot be started or dies before it is ready.
    pub(crate) fn spawn(
        index: usize,
        config: Arc<ConnectionConfig>,
        driver: Arc<dyn Driver>,
        registry: Arc<HandleRegistry>,
    ) -> Result<Self, PoolError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<()>(1);
        let call_timeout = config.call_timeout;

        let thread = thread::Builder::new()
            .name(format!("sql-worker-{index}"))
            .spawn(move || {
                let state = ConnectionState::new(index, config, driver, registry);
                if ready_tx.send(()).is_err() {
                    return;
                }
                run_worker(state, &receiver);
            })
            .map_err(|err| PoolError::Spawn(format!("worker {index}: {err}")))?;

        if ready_rx.recv().is_err() {
            let _ = thread.join();
            return Err(PoolError::Spawn(format!(
                "worker {index} exited before it was ready"
            )));
        }
        debug!(worker = index, "worker ready");

        Ok(Self {
            index,
            sender,
            call_timeout,
            thread: Some(thread),
        })
    }

    /// Run `request` on the worker thread and block until it answers or the call times out.
    pub fn execute(&self, request: QueryRequest) -> QueryResult {
        let (tx, rx) = mpsc::sync_channel(1);
        if let Err(err) = self.send(request, Responder::Blocking(tx)) {
            return QueryResult::failed(err);
        }
        let received = match self.call_timeout {
            Some(timeout) => rx.recv_timeout(timeout).map_err(|err| match err {
                RecvTimeoutError::Timeout => PoolError::Timeout { waited: timeout },
                RecvTimeoutError::Disconnected => PoolError::WorkerClosed,
            }),
            None => rx.recv().map_err(|_| PoolError::WorkerClosed),
        };
        received.unwrap_or_else(QueryResult::failed)
    }

    /// Async counterpart of [`ConnectionWorker::execute`]; never blocks the runtime thread.
    pub async fn execute_async(&self, request: QueryRequest) -> QueryResult {
        let (tx, rx) = oneshot::channel();
        if let Err(err) = self.send(request, Responder::Async(tx)) {
            return QueryResult::failed(err);
        }
        let received = match self.call_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, rx).await {
                Ok(reply) => reply.map_err(|_| PoolError::WorkerClosed),
                Err(_) => Err(PoolError::Timeout { waited: timeout }),
            },
            None => rx.await.map_err(|_| PoolError::WorkerClosed),
        };
        received.unwrap_or_else(QueryResult::failed)
    }

    /// Queue a shutdown behind any pending work without waiting for the thread.
    pub(crate) fn request_shutdown(&self) {
        let _ = self.sender.send(Command::Shutdown);
    }

    fn send(&self, request: QueryRequest, respond_to: Responder) -> Result<(), PoolError> {
        self.sender
            .send(Command::Execute {
                request,
                respond_to,
            })
            .map_err(|_| PoolError::WorkerClosed)
    }
}

impl Drop for ConnectionWorker {
    // Queued requests drain before the shutdown command is seen; then the thread is joined.
    fn drop(&mut self) {
        self.request_shutdown();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(worker = self.index, "connection worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for ConnectionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionWorker")
            .field("index", &self.index)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
