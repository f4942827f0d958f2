//! Logging initialization.

use autosnap_util::log::{self, LogConfig, LogLevel};
use std::path::PathBuf;

/// Initialize logging based on verbosity.
///
/// With a log file, logs are appended there at info level; otherwise
/// warnings and errors go to stderr. Returns the log file path if logging
/// to a file.
pub fn init_logging(verbose: bool, file: Option<PathBuf>) -> Option<PathBuf> {
    let level = if verbose {
        LogLevel::Debug
    } else if file.is_some() {
        LogLevel::Info
    } else {
        LogLevel::Warn
    };

    log::init(LogConfig {
        level,
        include_location: verbose,
        file,
    })
}
