//! # Logging Setup
//!
//! Console output for the operator, JSON lines in a per-run file for later
//! inspection. `RUST_LOG` overrides the configured level when set.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Deletes every `<app_name>_*.log` in `log_dir` except the newest one.
///
/// Returns how many files were removed. Files that cannot be removed are
/// reported on stderr and skipped.
pub fn cleanup_old_logs(log_dir: &Path, app_name: &str) -> Result<usize> {
    let prefix = format!("{app_name}_");
    let mut logs: Vec<PathBuf> = fs::read_dir(log_dir)
        .with_context(|| format!("Failed to read log directory {}", log_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix))
        })
        .collect();

    // Timestamped names sort chronologically; newest first.
    logs.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut removed = 0;
    for old in logs.iter().skip(1) {
        match fs::remove_file(old) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Failed to delete old log file {}: {}", old.display(), e),
        }
    }
    Ok(removed)
}

/// Creates `log_dir` and returns the path for this run's file. Existing logs
/// are left alone.
pub fn prepare_log_file(log_dir: &Path, app_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(log_dir).with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_name = format!("{}_{}.log", app_name, chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
    Ok(log_dir.join(file_name))
}

/// Installs the global subscriber.
///
/// `level` is a filter directive such as `info` or `lib_spectrum=debug`, used
/// when `RUST_LOG` is unset. With `console` the same events are mirrored to
/// stderr, leaving stdout to whatever the binary renders.
///
/// Keep the returned guard alive for the lifetime of the process; dropping it
/// flushes and stops the file writer.
///
/// # Errors
/// Fails when the log directory is unusable, the filter directive is invalid
/// or a global subscriber is already installed.
pub fn setup_logging(app_name: &str, log_dir: &Path, level: &str, console: bool) -> Result<WorkerGuard> {
    let log_path = prepare_log_file(log_dir, app_name)?;
    let file_name = log_path
        .file_name()
        .context("Log path has no file name")?
        .to_owned();

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level directive '{level}'"))?;

    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking_appender).json();
    let console_layer = console.then(|| {
        fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    // Only prune once this run owns the logger, so a rejected call deletes nothing.
    match cleanup_old_logs(log_dir, app_name) {
        Ok(removed) if removed > 0 => tracing::debug!(removed, "Old log files removed"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to prune old log files"),
    }

    tracing::info!(filter = level, file = %log_path.display(), "Logging initialized");
    Ok(guard)
}
