use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console logging plus a daily-rolling JSON log file in `log_dir`.
///
/// The returned guard must stay alive for the file writer to flush on exit.
pub fn init_logging(log_dir: impl AsRef<Path>) -> Option<WorkerGuard> {
    let log_dir = log_dir.as_ref();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("season_stats=info"));

    // Fall back to console-only if the log directory can't be created
    if fs::create_dir_all(log_dir).is_err() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, "season_stats.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // Installs the global subscriber, so this is the only test that may call it
    #[test]
    fn test_init_logging_writes_to_log_dir() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        let guard = init_logging(&log_dir);
        assert!(guard.is_some());
        tracing::info!("logging initialized");
        drop(guard);

        let files: Vec<_> = fs::read_dir(&log_dir).unwrap().collect();
        assert!(!files.is_empty());
    }
}
