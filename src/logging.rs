//! Structured JSONL logging plus human-readable stderr output.
//!
//! Dual-output logging for the orchestration layer:
//! - **JSONL to file** (~/.window-kit/logs/window-kit.jsonl) - structured,
//!   machine-parseable
//! - **Pretty to stderr** - compact, for developers
//!
//! # Usage
//!
//! ```rust,ignore
//! use window_kit::logging;
//!
//! // Initialize logging - keep the guard alive for the program's duration
//! let _guard = logging::init();
//!
//! tracing::info!(event_type = "window_open", class_name = "SettingsWindow", "Window opened");
//! ```

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that must be kept alive for the duration of the program;
/// dropping it flushes remaining logs and closes the file. Calling this twice
/// in one process will fail to install the second subscriber, so embedders
/// that already run their own `tracing` subscriber should simply not call it.
pub fn init() -> LoggingGuard {
    let log_dir = log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join("window-kit.jsonl");

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .unwrap_or_else(|e| {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            OpenOptions::new()
                .write(true)
                .open("/dev/null")
                .expect("Failed to open /dev/null")
        });

    // Non-blocking writer keeps logging off the dispatch path
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);

    // Default to info, allow override via RUST_LOG
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // JSONL layer for file output
    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    // Pretty layer for stderr
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();

    tracing::info!(
        event_type = "lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "window-kit logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Get the log directory path (~/.window-kit/logs/)
fn log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".window-kit").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("window-kit-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    log_dir().join("window-kit.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_ends_with_jsonl() {
        let path = log_path();
        assert_eq!(path.file_name().unwrap(), "window-kit.jsonl");
    }

    #[test]
    fn log_dir_is_stable() {
        // Two calls resolve to the same directory (no per-call randomness)
        assert_eq!(log_dir(), log_dir());
    }
}
