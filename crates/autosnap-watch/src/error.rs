//! Error types for the watch crate.

use thiserror::Error;

/// Errors raised while starting a watch.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The filesystem notification layer failed.
    #[error("watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The project could not be opened.
    #[error("core error: {0}")]
    Core(#[from] autosnap_core::CoreError),
}

/// Result type for watch operations.
pub type WatchResult<T> = Result<T, WatchError>;
