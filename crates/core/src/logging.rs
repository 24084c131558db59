use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default log directory, `~/.lsifkit/logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lsifkit/logs")
}

/// Installs the global subscriber: a daily-rolled file under `log_dir` plus an
/// optional stderr layer. `default_level` applies when `RUST_LOG` is unset.
///
/// The returned guard must be held until exit or buffered lines are lost.
pub fn init_logging(
    component: &str,
    log_dir: &Path,
    default_level: &str,
    to_stderr: bool,
) -> WorkerGuard {
    let _ = std::fs::create_dir_all(log_dir);

    // Files look like index.log.2026-10-19
    let file_appender = tracing_appender::rolling::daily(log_dir, format!("{component}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if to_stderr {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        let _ = registry.with(stderr_layer).try_init();
    } else {
        let _ = registry.try_init();
    }

    guard
}
