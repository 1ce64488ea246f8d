#![allow(dead_code)]

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use sql_affinity_pool::prelude::*;

/// One statement as seen by a stub handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub thread: String,
    pub handle: String,
    pub bound: Vec<Value>,
}

/// Knobs and counters shared by a [`StubDriver`] and every handle it creates.
#[derive(Debug)]
pub struct StubState {
    pub server_up: AtomicBool,
    pub force_closed_once: AtomicBool,
    pub sleep_ms: AtomicU64,
    pub handles_created: AtomicUsize,
    pub handles_closed: AtomicUsize,
    pub open_attempts: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub overlaps: AtomicUsize,
    pub calls: Mutex<Vec<Call>>,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            server_up: AtomicBool::new(true),
            force_closed_once: AtomicBool::new(false),
            sleep_ms: AtomicU64::new(0),
            handles_created: AtomicUsize::new(0),
            handles_closed: AtomicUsize::new(0),
            open_attempts: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            overlaps: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl StubState {
    pub fn set_server_up(&self, up: bool) {
        self.server_up.store(up, Ordering::SeqCst);
    }

    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }

    pub fn handles_created(&self) -> usize {
        self.handles_created.load(Ordering::SeqCst)
    }

    /// Calls other than the probe statement.
    pub fn statements(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.sql != "SELECT 1")
            .cloned()
            .collect()
    }
}

/// Scriptable driver standing in for a native client library.
///
/// Statements containing `BAD` fail at statement level, `SLEEP` waits `sleep_ms`, and every
/// statement fails once the server is marked down.
#[derive(Debug, Clone, Default)]
pub struct StubDriver {
    pub state: Arc<StubState>,
}

impl StubDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Driver for StubDriver {
    fn create_handle(
        &self,
        name: &str,
        _config: &ConnectionConfig,
    ) -> Result<Box<dyn NativeHandle>, DriverError> {
        self.state.handles_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubHandle {
            name: name.to_string(),
            state: Arc::clone(&self.state),
            opened: Cell::new(false),
            last_error: None,
        }))
    }
}

struct StubHandle {
    name: String,
    state: Arc<StubState>,
    // Cell keeps the handle !Sync, like most native client handles.
    opened: Cell<bool>,
    last_error: Option<DriverError>,
}

impl NativeHandle for StubHandle {
    fn open(&mut self) -> Result<(), DriverError> {
        self.state.open_attempts.fetch_add(1, Ordering::SeqCst);
        if self.state.server_up.load(Ordering::SeqCst) {
            self.opened.set(true);
            self.last_error = None;
            Ok(())
        } else {
            let err = DriverError::connection("can't connect to server").with_native_code("2003");
            self.last_error = Some(err.clone());
            Err(err)
        }
    }

    fn is_open(&self) -> bool {
        if self.state.force_closed_once.swap(false, Ordering::SeqCst) {
            self.opened.set(false);
        }
        self.opened.get()
    }

    fn last_error(&self) -> Option<DriverError> {
        self.last_error.clone()
    }

    fn execute(&mut self, sql: &str, params: &Params) -> Result<StatementOutput, DriverError> {
        if self.state.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.state.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let outcome = self.run(sql, params);
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Err(err) = &outcome {
            self.last_error = Some(err.clone());
        }
        outcome
    }

    fn close(&mut self) {
        self.opened.set(false);
        self.state.handles_closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl StubHandle {
    fn run(&mut self, sql: &str, params: &Params) -> Result<StatementOutput, DriverError> {
        let thread_name = thread::current().name().unwrap_or_default().to_string();
        let bound = match params {
            Params::None => Vec::new(),
            Params::Positional(values) => values.clone(),
            Params::Named(values) => values.values().cloned().collect(),
        };
        self.state.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            thread: thread_name.clone(),
            handle: self.name.clone(),
            bound: bound.clone(),
        });

        if sql.starts_with("SLEEP") {
            let ms = self.state.sleep_ms.load(Ordering::SeqCst);
            thread::sleep(Duration::from_millis(ms));
        }
        if !self.state.server_up.load(Ordering::SeqCst) {
            return Err(DriverError::connection("server has gone away").with_native_code("2006"));
        }
        if sql.contains("BAD") {
            return Err(DriverError::statement("syntax error").with_native_code("1064"));
        }

        let mut row = vec![Value::Text(thread_name)];
        row.extend(bound);
        let mut columns = vec!["thread".to_string()];
        columns.extend((1..row.len()).map(|i| format!("arg{i}")));
        Ok(StatementOutput {
            columns,
            rows: vec![row],
            last_insert_id: None,
            rows_affected: None,
        })
    }
}

pub fn stub_config(reopen_interval: Duration) -> ConnectionConfig {
    ConnectionConfig::builder(DriverKind::Mysql)
        .database_name("stub")
        .auto_reopen_interval(reopen_interval)
        .call_timeout(Some(Duration::from_secs(10)))
        .finish()
        .unwrap()
}

/// Pool over a fresh stub driver and a private registry.
pub fn stub_pool(
    size: usize,
    config: ConnectionConfig,
) -> (Pool, Arc<StubState>, Arc<HandleRegistry>) {
    let driver = StubDriver::new();
    let state = Arc::clone(&driver.state);
    let registry = Arc::new(HandleRegistry::new());
    let pool = Pool::builder(config)
        .connections(size)
        .registry(Arc::clone(&registry))
        .build(driver)
        .unwrap();
    (pool, state, registry)
}

/// Name of the worker thread that produced the first row of `result`.
pub fn served_by(result: &QueryResult) -> String {
    result
        .records()
        .first()
        .and_then(|r| r.get("thread"))
        .and_then(Value::as_text)
        .unwrap_or_default()
        .to_string()
}
