//! Per-path processing of settled file changes.

use autosnap_core::{CoreResult, FileFilter, TrackingPolicy, Workspace};
use autosnap_diff::{evaluate, Thresholds, Verdict};
use autosnap_snapshot::{CreateOutcome, SnapshotError, SnapshotResult, SnapshotStore, VersionId};
use autosnap_util::{path, TimingGuard};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Decision taken when a raw event arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Tracked file; carries its path relative to the root.
    Accept(PathBuf),
    /// Outside the root, filtered out, not a regular file, or gone.
    Ignored,
    /// Over the size ceiling.
    TooLarge,
}

/// Result of processing one settled change.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// A new version was recorded.
    Recorded(VersionId),
    /// The content already matched the current version.
    Unchanged,
    /// A significance gate suppressed the change.
    NotMeaningful(Verdict),
    /// The file grew past the size ceiling before processing.
    SkippedTooLarge,
    /// Another change to the same path is still being processed.
    AlreadyProcessing,
    /// Processing failed; the error was logged.
    Failed(String),
}

type InFlight = Arc<Mutex<HashSet<PathBuf>>>;

/// Claim on a path while its change is processed.
///
/// Dropping the guard releases the path.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: InFlight,
    path: PathBuf,
}

impl InFlightGuard {
    /// Claimed path, relative to the root.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}

/// Decides what happens to each file change under the watched root.
pub struct Scheduler {
    root: PathBuf,
    policy: Arc<TrackingPolicy>,
    thresholds: Thresholds,
    filter: FileFilter,
    store: Arc<SnapshotStore>,
    in_flight: InFlight,
}

impl Scheduler {
    /// Create a scheduler.
    pub fn new(
        root: PathBuf,
        policy: Arc<TrackingPolicy>,
        store: Arc<SnapshotStore>,
    ) -> CoreResult<Self> {
        let filter = FileFilter::new(&policy.include, &policy.exclude)?;
        Ok(Self {
            root,
            thresholds: policy.thresholds(),
            policy,
            filter,
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Create a scheduler over an opened project.
    pub fn for_workspace(workspace: &Workspace) -> Self {
        Self {
            root: workspace.root().to_path_buf(),
            policy: Arc::clone(workspace.policy()),
            thresholds: workspace.policy().thresholds(),
            filter: workspace.filter().clone(),
            store: Arc::clone(workspace.store()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Watched root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tracking policy.
    pub fn policy(&self) -> &TrackingPolicy {
        &self.policy
    }

    /// Classify a raw event path. Checks the size ceiling synchronously.
    pub fn admit(&self, file: &Path) -> Admission {
        let Some(relative) = path::relative_to(file, &self.root) else {
            return Admission::Ignored;
        };
        if !self.filter.is_tracked(&relative) {
            return Admission::Ignored;
        }

        match std::fs::metadata(self.root.join(&relative)) {
            Ok(metadata) if !metadata.is_file() => Admission::Ignored,
            Ok(metadata) if self.policy.exceeds_size_limit(metadata.len()) => {
                debug!(path = %relative.display(), size = metadata.len(), "File over size limit");
                Admission::TooLarge
            }
            Ok(_) => Admission::Accept(relative),
            Err(_) => Admission::Ignored,
        }
    }

    /// Claim a path for processing.
    ///
    /// Returns `None` if the path is already being processed.
    pub fn try_begin(&self, relative: &Path) -> Option<InFlightGuard> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(relative.to_path_buf());

        inserted.then(|| InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            path: relative.to_path_buf(),
        })
    }

    /// Whether a path is currently being processed.
    pub fn is_processing(&self, relative: &Path) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(relative)
    }

    /// Claim and process a path.
    pub async fn process(&self, relative: &Path) -> ProcessOutcome {
        match self.try_begin(relative) {
            Some(guard) => self.process_claimed(guard).await,
            None => {
                debug!(path = %relative.display(), "Already processing, event dropped");
                ProcessOutcome::AlreadyProcessing
            }
        }
    }

    /// Process a claimed path, releasing it when done. Never fails.
    pub async fn process_claimed(&self, guard: InFlightGuard) -> ProcessOutcome {
        let relative = guard.path();
        let _timing = TimingGuard::event(relative.display().to_string());

        match self.record_if_meaningful(relative).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(path = %relative.display(), error = %e, "Failed to process change");
                ProcessOutcome::Failed(e.to_string())
            }
        }
    }

    async fn record_if_meaningful(&self, relative: &Path) -> SnapshotResult<ProcessOutcome> {
        let absolute = self.root.join(relative);

        let size = tokio::fs::metadata(&absolute).await?.len();
        if self.policy.exceeds_size_limit(size) {
            debug!(path = %relative.display(), size, "File over size limit");
            return Ok(ProcessOutcome::SkippedTooLarge);
        }

        let bytes = tokio::fs::read(&absolute).await?;
        let content =
            String::from_utf8(bytes).map_err(|_| SnapshotError::NotText(relative.to_path_buf()))?;

        let previous = self
            .store
            .read_history(relative)
            .await?
            .map(|history| history.current_content);

        let thresholds = self.thresholds.clone();
        let (verdict, content) = tokio::task::spawn_blocking(move || {
            let verdict = evaluate(previous.as_deref(), Some(&content), &thresholds);
            (verdict, content)
        })
        .await?;
        if !verdict.is_meaningful() {
            debug!(path = %relative.display(), ?verdict, "Change not meaningful");
            return Ok(ProcessOutcome::NotMeaningful(verdict));
        }

        Ok(match self.store.record(relative, &content).await? {
            CreateOutcome::Root(id) | CreateOutcome::Appended { id, .. } => {
                info!(path = %relative.display(), id = %id, "Snapshot recorded");
                ProcessOutcome::Recorded(id)
            }
            CreateOutcome::Unchanged => ProcessOutcome::Unchanged,
        })
    }
}
