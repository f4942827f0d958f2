//! Duration logging for watch events and batch store operations.
//!
//! ```rust,ignore
//! let _timing = TimingGuard::event("src/main.rs");
//! // significance check and store write
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const NOTABLE: Duration = Duration::from_millis(100);
const SLOW: Duration = Duration::from_secs(5);

/// Logs how long an operation took when dropped: debug under 100ms, info
/// under 5s, warn beyond.
pub struct TimingGuard {
    kind: &'static str,
    target: String,
    start: Instant,
}

impl TimingGuard {
    /// Time the processing of one settled change.
    pub fn event(path: impl Into<String>) -> Self {
        Self::start("event", path.into())
    }

    /// Time a batch operation such as the initial scan or a restore.
    pub fn batch(name: impl Into<String>) -> Self {
        Self::start("batch", name.into())
    }

    fn start(kind: &'static str, target: String) -> Self {
        debug!(kind, target = %target, "Starting");
        Self {
            kind,
            target,
            start: Instant::now(),
        }
    }

    /// Time since the guard was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        if elapsed >= SLOW {
            warn!(kind = self.kind, target = %self.target, duration_ms, "Slow operation");
        } else if elapsed >= NOTABLE {
            info!(kind = self.kind, target = %self.target, duration_ms, "Finished");
        } else {
            debug!(kind = self.kind, target = %self.target, duration_ms, "Finished");
        }
    }
}
