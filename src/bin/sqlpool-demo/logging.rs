use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

/// Install the demo's subscriber.
///
/// Human-readable lines go to stdout. With `log_file`, the same events are also written there as
/// JSON lines, thread name included, so a run can be checked for worker affinity afterwards.
/// `RUST_LOG` overrides the default level; `verbose` lowers that default to `debug`.
pub(crate) fn init(log_file: Option<&Path>, verbose: bool) -> io::Result<()> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = || {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_filter(filter());

    let file = log_file.map(File::create).transpose()?.map(|file| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_thread_names(true)
            .with_writer(Arc::new(file))
            .with_filter(filter())
    });

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_receives_json_lines_with_thread_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.log");
        init(Some(&path), false).unwrap();

        std::thread::Builder::new()
            .name("sql-worker-9".into())
            .spawn(|| tracing::info!(rows = 3, "seeded table test"))
            .unwrap()
            .join()
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let line: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(line["threadName"], "sql-worker-9");
        assert_eq!(line["fields"]["message"], "seeded table test");
        assert_eq!(line["fields"]["rows"], 3);
    }
}
