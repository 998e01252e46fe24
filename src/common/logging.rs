//! Logging and tracing configuration
//!
//! Logs go to stderr so they never interleave with the report printed on
//! stdout. An optional log file receives the same events without ANSI codes.

use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("api_scenarios=info,warn"))
}

/// Initialize tracing for the CLI
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
///
/// When `log_file` is given, events are also appended to that file. The
/// returned guard must be held until exit so buffered lines are flushed.
pub fn init_cli(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let (file_layer, guard) = match log_file.and_then(open_log_file) {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(default_filter())
        .with(file_layer)
        .with(stderr_layer)
        .init();

    guard
}

fn open_log_file(path: &Path) -> Option<File> {
    let opened = paths::ensure_parent_dir(path)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(path));

    match opened {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: Could not open log file '{}': {}", path.display(), e);
            None
        }
    }
}

/// Default location for `--log-file` without an explicit path
pub fn default_log_path() -> Option<std::path::PathBuf> {
    paths::log_dir().map(|d| d.join("runs.log"))
}
