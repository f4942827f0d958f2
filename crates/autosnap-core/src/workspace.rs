//! Project-level operations over the version store.
//!
//! These are the batch operations behind the command-line surface. Failures
//! scoped to one file are collected in the returned report and never abort
//! the rest of the batch.

use crate::config::TrackingPolicy;
use crate::error::CoreResult;
use crate::filter::FileFilter;
use autosnap_snapshot::{FileHistory, SnapshotError, SnapshotStore, StorageReport, VersionId};
use autosnap_util::{path, TimingGuard};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A failure affecting a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// Path relative to the root.
    pub path: PathBuf,
    /// Error message.
    pub message: String,
}

impl FileFailure {
    fn new(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a full-tree scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Files for which a version was recorded.
    pub recorded: usize,
    /// Files whose content already matched the current version.
    pub unchanged: usize,
    /// Files skipped for size or because they are not text.
    pub skipped: usize,
    /// Files that could not be recorded.
    pub failed: Vec<FileFailure>,
}

/// Outcome of [`Workspace::init`].
#[derive(Debug, Clone, Default)]
pub struct InitReport {
    /// Whether the config file was created by this call.
    pub created: bool,
    /// Initial scan results; empty when the project was already initialized.
    pub scan: ScanReport,
}

/// Histories of the tracked files matching a pattern.
#[derive(Debug, Default)]
pub struct HistoryReport {
    /// Readable histories, most recently updated first.
    pub files: Vec<FileHistory>,
    /// Artifacts that could not be read.
    pub failed: Vec<FileFailure>,
}

/// Outcome of a multi-file restore.
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    /// Files restored and written back.
    pub restored: Vec<PathBuf>,
    /// Files that have the version but could not be restored.
    pub failed: Vec<FileFailure>,
}

impl RestoreReport {
    /// Whether no matching file had the version.
    pub fn is_empty(&self) -> bool {
        self.restored.is_empty() && self.failed.is_empty()
    }
}

/// A project directory with its policy and version store.
pub struct Workspace {
    root: PathBuf,
    policy: Arc<TrackingPolicy>,
    filter: FileFilter,
    store: Arc<SnapshotStore>,
}

impl Workspace {
    /// Open a project, loading its policy from disk.
    pub async fn open(root: impl Into<PathBuf>) -> CoreResult<Self> {
        let root = root.into();
        let policy = TrackingPolicy::load(&root).await?;
        Self::with_policy(root, policy).await
    }

    /// Open a project with an explicit policy.
    pub async fn with_policy(root: impl Into<PathBuf>, policy: TrackingPolicy) -> CoreResult<Self> {
        let root = root.into();
        policy.validate()?;
        let filter = FileFilter::new(&policy.include, &policy.exclude)?;
        let store = SnapshotStore::new(root.clone(), policy.store_config()).await?;

        Ok(Self {
            root,
            policy: Arc::new(policy),
            filter,
            store: Arc::new(store),
        })
    }

    /// Whether the project has been initialized.
    pub async fn is_initialized(root: &Path) -> CoreResult<bool> {
        Ok(tokio::fs::try_exists(path::config_path(root)).await?)
    }

    /// Initialize a project.
    ///
    /// Writes the default config if absent. On first initialization every
    /// tracked file is recorded once.
    pub async fn init(root: impl Into<PathBuf>) -> CoreResult<InitReport> {
        let root = root.into();
        let created = TrackingPolicy::init(&root).await?;
        if !created {
            return Ok(InitReport::default());
        }

        let workspace = Self::open(root).await?;
        let scan = workspace.scan().await;
        info!(
            recorded = scan.recorded,
            skipped = scan.skipped,
            failed = scan.failed.len(),
            "Initial snapshot complete"
        );
        Ok(InitReport {
            created: true,
            scan,
        })
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tracking policy.
    pub fn policy(&self) -> &Arc<TrackingPolicy> {
        &self.policy
    }

    /// Include/exclude filter.
    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    /// Version store.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Relative paths of every tracked file currently on disk.
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .map(|rel| !self.filter.is_excluded_dir(rel))
                    .unwrap_or(false)
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Failed to read directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            if self.filter.is_tracked(relative) {
                files.push(relative.to_path_buf());
            }
        }
        files
    }

    /// Record every tracked file once.
    pub async fn scan(&self) -> ScanReport {
        let _timing = TimingGuard::batch("initial scan");
        let mut report = ScanReport::default();

        for relative in self.tracked_files() {
            match self.store.create_version(&relative).await {
                Ok(outcome) if outcome.is_recorded() => report.recorded += 1,
                Ok(_) => report.unchanged += 1,
                Err(SnapshotError::SizeLimitExceeded { .. } | SnapshotError::NotText(_)) => {
                    debug!(path = %relative.display(), "Skipped during scan");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(path = %relative.display(), error = %e, "Failed to record file");
                    report.failed.push(FileFailure::new(relative, e));
                }
            }
        }

        report
    }

    /// Histories of tracked files whose relative path contains `pattern`.
    pub async fn history(&self, pattern: Option<&str>) -> CoreResult<HistoryReport> {
        let mut report = HistoryReport::default();

        for relative in self.matching_artifacts(pattern).await? {
            match self.store.read_history(&relative).await {
                Ok(Some(history)) => report.files.push(history),
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %relative.display(), error = %e, "Failed to read history");
                    report.failed.push(FileFailure::new(relative, e));
                }
            }
        }

        report.files.sort_by_key(|history| {
            std::cmp::Reverse(history.current_node().map(|node| node.timestamp()))
        });
        Ok(report)
    }

    /// Restore every matching file that has version `target`.
    ///
    /// Files without that version are skipped silently.
    pub async fn restore(
        &self,
        target: &VersionId,
        pattern: Option<&str>,
    ) -> CoreResult<RestoreReport> {
        let _timing = TimingGuard::batch(format!("restore {target}"));
        let mut report = RestoreReport::default();

        for relative in self.matching_artifacts(pattern).await? {
            let content = match self.store.restore(&relative, target).await {
                Ok(content) => content,
                Err(e) if e.is_version_not_found() => continue,
                Err(e) => {
                    warn!(path = %relative.display(), error = %e, "Failed to restore");
                    report.failed.push(FileFailure::new(relative, e));
                    continue;
                }
            };

            match self.write_back(&relative, &content).await {
                Ok(()) => report.restored.push(relative),
                Err(e) => {
                    warn!(path = %relative.display(), error = %e, "Failed to write restored file");
                    report.failed.push(FileFailure::new(relative, e));
                }
            }
        }

        Ok(report)
    }

    /// Discard all recorded history.
    pub async fn clear(&self) -> CoreResult<()> {
        self.store.clear().await?;
        Ok(())
    }

    /// Raw versus compressed storage figures for one file.
    pub async fn storage_report(&self, file: &Path) -> CoreResult<Option<StorageReport>> {
        Ok(self.store.storage_report(file).await?)
    }

    async fn matching_artifacts(&self, pattern: Option<&str>) -> CoreResult<Vec<PathBuf>> {
        let files = self.store.tracked_files().await?;
        Ok(files
            .into_iter()
            .filter(|file| match pattern {
                Some(pattern) => file.to_string_lossy().contains(pattern),
                None => true,
            })
            .collect())
    }

    async fn write_back(&self, relative: &Path, content: &str) -> std::io::Result<()> {
        let absolute = self.root.join(relative);
        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&absolute, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let file = root.join(relative);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
    }

    async fn initialized() -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# Project\n");
        write(dir.path(), "src/main.rs", "fn main() {}\n");
        write(dir.path(), "node_modules/dep/index.js", "module.exports = 1;\n");
        write(dir.path(), ".env", "SECRET=1\n");

        let report = Workspace::init(dir.path()).await.unwrap();
        assert!(report.created);
        assert_eq!(report.scan.recorded, 2);
        assert!(report.scan.failed.is_empty());

        let workspace = Workspace::open(dir.path()).await.unwrap();
        (dir, workspace)
    }

    #[tokio::test]
    async fn test_init_scans_tracked_files_once() {
        let (dir, workspace) = initialized().await;

        assert_eq!(
            workspace.store().tracked_files().await.unwrap(),
            vec![PathBuf::from("README.md"), PathBuf::from("src/main.rs")]
        );

        let again = Workspace::init(dir.path()).await.unwrap();
        assert!(!again.created);
        assert_eq!(again.scan.recorded, 0);
        assert!(Workspace::is_initialized(dir.path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_skips_oversized_and_binary_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "small.txt", "ok\n");
        write(dir.path(), "large.txt", &"x".repeat(2048));
        std::fs::write(dir.path().join("blob.bin"), [0xffu8, 0x00, 0xfe]).unwrap();

        let policy = TrackingPolicy {
            max_file_size_mb: 0.001,
            ..Default::default()
        };
        let workspace = Workspace::with_policy(dir.path(), policy).await.unwrap();
        let report = workspace.scan().await;

        assert_eq!(report.recorded, 1);
        assert_eq!(report.skipped, 2);
        assert!(report.failed.is_empty());

        let again = workspace.scan().await;
        assert_eq!(again.unchanged, 1);
        assert_eq!(again.recorded, 0);
    }

    #[tokio::test]
    async fn test_history_filters_by_substring() {
        let (_dir, workspace) = initialized().await;

        let all = workspace.history(None).await.unwrap();
        assert_eq!(all.files.len(), 2);

        let filtered = workspace.history(Some("main")).await.unwrap();
        assert_eq!(filtered.files.len(), 1);
        assert_eq!(filtered.files[0].path, PathBuf::from("src/main.rs"));
        assert_eq!(filtered.files[0].current_content, "fn main() {}\n");

        assert!(workspace
            .history(Some("nothing"))
            .await
            .unwrap()
            .files
            .is_empty());
    }

    #[tokio::test]
    async fn test_history_sorted_by_current_version_time() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::with_policy(dir.path(), TrackingPolicy::default())
            .await
            .unwrap();
        let store = workspace.store();
        let pause = || tokio::time::sleep(std::time::Duration::from_millis(5));

        let first = store.record(Path::new("old.txt"), "one\n").await.unwrap();
        let first = first.id().unwrap().clone();
        pause().await;
        store.record(Path::new("new.txt"), "two\n").await.unwrap();
        pause().await;
        store
            .record(Path::new("old.txt"), "one\nmore\n")
            .await
            .unwrap();

        let order = |report: HistoryReport| -> Vec<PathBuf> {
            report.files.into_iter().map(|history| history.path).collect()
        };
        assert_eq!(
            order(workspace.history(None).await.unwrap()),
            vec![PathBuf::from("old.txt"), PathBuf::from("new.txt")]
        );

        store.restore(Path::new("old.txt"), &first).await.unwrap();
        assert_eq!(
            order(workspace.history(None).await.unwrap()),
            vec![PathBuf::from("new.txt"), PathBuf::from("old.txt")]
        );
    }

    #[tokio::test]
    async fn test_corrupt_artifact_does_not_hide_other_files() {
        let (dir, workspace) = initialized().await;
        std::fs::write(path::store_dir(dir.path()).join("README.md.snap"), b"junk").unwrap();

        let report = workspace.history(None).await.unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, PathBuf::from("README.md"));

        let main = workspace.store().read_history(Path::new("src/main.rs")).await;
        let root = main.unwrap().unwrap().current_id;
        let restored = workspace.restore(&root, None).await.unwrap();
        assert_eq!(restored.restored, vec![PathBuf::from("src/main.rs")]);
        assert_eq!(restored.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_writes_back_and_skips_files_without_version() {
        let (dir, workspace) = initialized().await;
        let file = Path::new("src/main.rs");
        let root = workspace
            .store()
            .read_history(file)
            .await
            .unwrap()
            .unwrap()
            .current_id;

        write(dir.path(), "src/main.rs", "fn main() {\n    run();\n}\n");
        workspace.store().create_version(file).await.unwrap();

        let report = workspace.restore(&root, None).await.unwrap();
        assert_eq!(report.restored, vec![PathBuf::from("src/main.rs")]);
        assert!(report.failed.is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join(file)).unwrap(),
            "fn main() {}\n"
        );

        let missing = workspace
            .restore(&VersionId::from_string("ver_unknown"), None)
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_restore_recreates_deleted_file() {
        let (dir, workspace) = initialized().await;
        let root = workspace
            .store()
            .read_history(Path::new("README.md"))
            .await
            .unwrap()
            .unwrap()
            .current_id;

        std::fs::remove_file(dir.path().join("README.md")).unwrap();
        let report = workspace.restore(&root, Some("README")).await.unwrap();
        assert_eq!(report.restored.len(), 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "# Project\n"
        );
    }

    #[tokio::test]
    async fn test_clear_and_storage_report() {
        let (_dir, workspace) = initialized().await;

        let report = workspace
            .storage_report(Path::new("README.md"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.raw.total, "# Project\n".len() as u64);
        assert!(report.compressed > 0);

        workspace.clear().await.unwrap();
        assert!(workspace.history(None).await.unwrap().files.is_empty());
        assert!(workspace
            .storage_report(Path::new("README.md"))
            .await
            .unwrap()
            .is_none());
    }
}
