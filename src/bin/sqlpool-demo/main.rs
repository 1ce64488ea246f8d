mod args;
mod logging;

use std::thread;
use std::time::Instant;

use clap::Parser;
use serde::Serialize;
use sql_affinity_pool::prelude::*;
use tracing::{debug, error, info};

use crate::args::{Args, DemoConfig};

#[derive(Debug, Default, Serialize)]
struct Summary {
    ok: usize,
    failed: usize,
    rows: usize,
    elapsed_ms: u128,
}

fn main() {
    let config = DemoConfig::from_args(Args::parse());
    if let Err(err) = logging::init(config.log.as_deref(), config.verbose) {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    }

    let config_json = serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".to_string());
    info!("config: {}", config_json);

    if let Err(err) = run(&config) {
        error!("demo failed: {err}");
        std::process::exit(1);
    }
}

fn run(config: &DemoConfig) -> Result<(), PoolError> {
    let pool = Pool::new(config.connections, config.connection_config()?, SqliteDriver::new())?;
    seed(&pool, config)?;

    let started = Instant::now();
    let per_thread: Vec<Summary> = thread::scope(|scope| {
        let handles: Vec<_> = (0..config.threads)
            .map(|_| scope.spawn(|| hammer(&pool, config)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_default())
            .collect()
    });

    let mut summary = per_thread.into_iter().fold(Summary::default(), |mut acc, s| {
        acc.ok += s.ok;
        acc.failed += s.failed;
        acc.rows += s.rows;
        acc
    });
    summary.elapsed_ms = started.elapsed().as_millis();

    let summary_json = serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string());
    info!("finished: {}", summary_json);
    Ok(())
}

/// In-memory databases are private to each connection, so every worker gets its own copy.
fn seed(pool: &Pool, config: &DemoConfig) -> Result<(), PoolError> {
    if config.seed_rows == 0 {
        return Ok(());
    }
    let in_memory = config.database.is_empty() || config.database == ":memory:";
    let copies = if in_memory { pool.size() } else { 1 };

    // Sequential calls visit every worker once per `pool.size()` calls.
    for _ in 0..copies {
        pool.query("CREATE TABLE IF NOT EXISTS test (id INTEGER PRIMARY KEY, name TEXT, created TEXT)")
            .into_result()?;
    }
    for i in 0..config.seed_rows {
        for _ in 0..copies {
            pool.query_with(
                "INSERT INTO test (name, created) VALUES (:name, datetime('now'))",
                Params::named([("name", format!("row-{i}"))]),
            )
            .into_result()?;
        }
    }
    info!(rows = config.seed_rows, copies, "seeded table test");
    Ok(())
}

fn hammer(pool: &Pool, config: &DemoConfig) -> Summary {
    let mut summary = Summary::default();
    for _ in 0..config.iterations {
        let result = pool.query(config.sql.as_str());
        if let Some(err) = result.error() {
            summary.failed += 1;
            error!("{err}");
            continue;
        }
        summary.ok += 1;
        summary.rows += result.records().len();
        if config.verbose {
            for record in result.records() {
                let line: Vec<String> = record.values().iter().map(ToString::to_string).collect();
                debug!("{}", line.join(" "));
            }
        }
    }
    summary
}
