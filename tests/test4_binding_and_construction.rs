mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use common::{StubDriver, stub_config, stub_pool};
use sql_affinity_pool::prelude::*;

#[test]
fn positional_and_named_bindings_bind_identical_values() {
    let (pool, state, _registry) = stub_pool(1, stub_config(Duration::from_secs(10)));

    let positional = pool.query_positional("SELECT ? ", vec![Value::Int(5)]);
    let mut named_args = BTreeMap::new();
    named_args.insert("x".to_string(), Value::Int(5));
    let named = pool.query_named("SELECT :x", named_args);

    assert!(positional.is_ok() && named.is_ok());
    let calls = state.statements();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].bound, vec![Value::Int(5)]);
    assert_eq!(calls[0].bound, calls[1].bound);
    assert_eq!(
        positional.records()[0].get("arg1"),
        named.records()[0].get("arg1")
    );
}

#[test]
fn plain_query_binds_nothing() {
    let (pool, state, _registry) = stub_pool(1, stub_config(Duration::from_secs(10)));
    assert!(pool.query("SELECT 99").is_ok());
    assert!(state.statements()[0].bound.is_empty());
}

#[test]
fn zero_connections_fails_before_anything_starts() {
    let driver = StubDriver::new();
    let state = Arc::clone(&driver.state);

    let err = Pool::new(0, stub_config(Duration::from_secs(10)), driver).unwrap_err();
    assert!(matches!(err, PoolError::Config(_)));
    assert_eq!(state.handles_created(), 0);
    // The driver was dropped with the failed builder; no worker kept a reference.
    assert_eq!(Arc::strong_count(&state), 1);
}

#[cfg(feature = "sqlite")]
#[test]
fn unsupported_driver_kind_is_rejected() {
    let config = ConnectionConfig::builder(DriverKind::Oracle)
        .finish()
        .unwrap();
    let err = Pool::new(2, config, SqliteDriver::new()).unwrap_err();
    assert!(matches!(err, PoolError::Config(msg) if msg.contains("oracle")));
}

#[test]
fn invalid_config_is_rejected_by_the_builder() {
    let mut config = stub_config(Duration::from_secs(1));
    config.call_timeout = Some(Duration::ZERO);
    let err = Pool::builder(config)
        .connections(2)
        .build(StubDriver::new())
        .unwrap_err();
    assert!(matches!(err, PoolError::Config(_)));
}
