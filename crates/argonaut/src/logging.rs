//! Runtime logging to a file.
//!
//! The TUI owns stdout and stderr while the alternate screen is active,
//! so all diagnostics go to `ARGONAUT_LOG_FILE` (an auto-created temp
//! path when unset) through a non-blocking writer.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable naming the log file.
pub const LOG_FILE_ENV: &str = "ARGONAUT_LOG_FILE";

/// Environment variable selecting the log level.
pub const LOG_LEVEL_ENV: &str = "ARGONAUT_LOG_LEVEL";

/// Resolves the log file path.
pub fn log_path() -> PathBuf {
    std::env::var(LOG_FILE_ENV).map_or_else(
        |_| {
            std::env::temp_dir().join(format!("argonaut-{}.log", std::process::id()))
        },
        PathBuf::from,
    )
}

/// Maps the configured level to a tracing filter directive.
fn level_directive() -> &'static str {
    match std::env::var(LOG_LEVEL_ENV).as_deref() {
        Ok("DEBUG") => "argonaut=debug",
        Ok("WARN") => "argonaut=warn",
        // tracing has no fatal level; errors are the closest severity.
        Ok("ERROR" | "FATAL") => "argonaut=error",
        _ => "argonaut=info",
    }
}

/// Initialises tracing to the log file.
///
/// The returned guard must stay alive for the process lifetime or tail
/// log lines are lost.
///
/// # Errors
/// Returns an error when the log file cannot be created.
pub fn init() -> std::io::Result<(PathBuf, WorkerGuard)> {
    let path = log_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level_directive()))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok((path, guard))
}
