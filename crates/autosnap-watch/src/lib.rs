//! Watch scheduler for autosnap.
//!
//! Filesystem notifications flow through three stages:
//! 1. Admission: the path must be tracked and under the size ceiling.
//! 2. Debounce: the path must stay quiet for the policy's debounce window.
//! 3. Processing: one change per path at a time; the significance engine
//!    decides whether the store records a new version.
//!
//! A failure while processing one file is logged and never stops the watch.

mod debounce;
mod error;
mod scheduler;
mod watcher;

pub use debounce::Debouncer;
pub use error::{WatchError, WatchResult};
pub use scheduler::{Admission, InFlightGuard, ProcessOutcome, Scheduler};
pub use watcher::{start_watch, watch, watch_root, WatchHandle};
