//! Logging setup using tracing.
//!
//! One-shot commands log to stderr. The watcher appends to a log file
//! inside the project so a long-running session leaves a trail.

use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default log level when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Include file and line in stderr output.
    pub include_location: bool,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

/// Install the global subscriber.
///
/// Returns the log file path when logs go to a file. If the file cannot be
/// opened, a warning is printed and logging falls back to stderr.
pub fn init(config: LogConfig) -> Option<PathBuf> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let subscriber = tracing_subscriber::registry().with(filter);

    if let Some(path) = config.file {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Warning: Could not create log directory: {e}");
            }
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                let fmt_layer = fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(file);
                subscriber.with(fmt_layer).init();
                return Some(path);
            }
            Err(e) => eprintln!("Warning: Could not open log file {}: {e}", path.display()),
        }
    }

    let fmt_layer = fmt::layer()
        .with_target(config.include_location)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(std::io::stderr);
    subscriber.with(fmt_layer).init();
    None
}
