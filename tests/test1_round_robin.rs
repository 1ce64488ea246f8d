mod common;

use std::time::Duration;

use common::{served_by, stub_config, stub_pool};

#[test]
fn sequential_calls_visit_workers_in_order_and_wrap() -> Result<(), Box<dyn std::error::Error>> {
    let (pool, state, _registry) = stub_pool(3, stub_config(Duration::from_secs(10)));

    let served: Vec<String> = (0..7)
        .map(|i| {
            let result = pool.query(format!("SELECT {i}"));
            assert!(result.is_ok(), "call {i} failed: {:?}", result.error());
            served_by(&result)
        })
        .collect();

    assert_eq!(
        served,
        [
            "sql-worker-0",
            "sql-worker-1",
            "sql-worker-2",
            "sql-worker-0",
            "sql-worker-1",
            "sql-worker-2",
            "sql-worker-0",
        ]
    );
    // One lazily opened handle per worker, never more.
    assert_eq!(state.open_attempts(), 3);
    assert_eq!(state.handles_created(), 3);
    Ok(())
}

#[test]
fn every_statement_runs_on_the_thread_that_owns_its_handle() {
    let (pool, state, _registry) = stub_pool(2, stub_config(Duration::from_secs(10)));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..25 {
                    assert!(pool.query("SELECT now").is_ok());
                }
            });
        }
    });

    let calls = state.statements();
    assert_eq!(calls.len(), 100);
    for call in &calls {
        assert!(call.thread.starts_with("sql-worker-"), "ran on {}", call.thread);
    }
    // A handle name is only ever seen from a single worker thread.
    for call in &calls {
        let owner = calls
            .iter()
            .find(|c| c.handle == call.handle)
            .map(|c| c.thread.clone());
        assert_eq!(owner.as_deref(), Some(call.thread.as_str()));
    }
}

#[test]
fn accessors_expose_the_construction_config() {
    let (pool, _state, _registry) = stub_pool(2, stub_config(Duration::from_millis(1500)));
    assert_eq!(pool.size(), 2);
    assert_eq!(pool.kind(), sql_affinity_pool::DriverKind::Mysql);
    assert_eq!(pool.database_name(), "stub");
    assert_eq!(pool.user_name(), "root");
    assert_eq!(pool.password(), "");
    assert_eq!(pool.host(), "127.0.0.1");
    assert_eq!(pool.port(), 3306);
    assert_eq!(pool.auto_reopen_interval(), Duration::from_millis(1500));
}

#[test]
fn handles_are_registered_while_alive_and_removed_on_drop() {
    let (pool, state, registry) = stub_pool(3, stub_config(Duration::from_secs(10)));
    assert!(registry.is_empty(), "handles are created lazily");

    for _ in 0..3 {
        assert!(pool.query("SELECT 42").is_ok());
    }
    assert_eq!(registry.len(), 3);

    drop(pool);
    assert!(registry.is_empty());
    assert_eq!(
        state.handles_closed.load(std::sync::atomic::Ordering::SeqCst),
        3
    );
}
