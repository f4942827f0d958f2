//! Per-file version store.

use crate::{decode, encode, SnapshotChain, SnapshotError, SnapshotResult, VersionId};
use autosnap_storage::{FileStorage, Storage};
use autosnap_util::path;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Configuration for the version store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Files larger than this many bytes are never versioned.
    pub max_file_size: Option<u64>,
}

/// Result of a create-version call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The file had no history; a root version was created.
    Root(VersionId),
    /// A new version was appended under the previous current version.
    Appended { id: VersionId, parent: VersionId },
    /// The content equals the current version; nothing was written.
    Unchanged,
}

impl CreateOutcome {
    /// Id of the recorded version, if one was recorded.
    pub fn id(&self) -> Option<&VersionId> {
        match self {
            CreateOutcome::Root(id) | CreateOutcome::Appended { id, .. } => Some(id),
            CreateOutcome::Unchanged => None,
        }
    }

    /// Whether a version was recorded.
    pub fn is_recorded(&self) -> bool {
        self.id().is_some()
    }
}

/// Version store for the files of one project.
///
/// Each tracked file has its own artifact holding its whole chain:
/// ```text
/// <root>/.auto-snap/store/
///   README.md.snap
///   src/
///     main.rs.snap
/// ```
/// Artifacts are loaded, mutated and replaced as a unit.
pub struct SnapshotStore {
    /// Backend holding one artifact per tracked file.
    storage: Arc<dyn Storage>,

    /// Project root directory (for resolving relative paths).
    project_root: PathBuf,

    /// Configuration.
    config: StoreConfig,
}

impl SnapshotStore {
    /// Open the on-disk store of a project, creating its directory if needed.
    pub async fn new(project_root: PathBuf, config: StoreConfig) -> SnapshotResult<Self> {
        let store_dir = path::store_dir(&project_root);
        fs::create_dir_all(&store_dir).await?;

        Ok(Self::with_storage(
            project_root,
            Arc::new(FileStorage::new(store_dir)),
            config,
        ))
    }

    /// Create a store over an arbitrary backend.
    pub fn with_storage(
        project_root: PathBuf,
        storage: Arc<dyn Storage>,
        config: StoreConfig,
    ) -> Self {
        Self {
            storage,
            project_root,
            config,
        }
    }

    /// Project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Record the file's current on-disk content as a new version.
    ///
    /// Files over the size ceiling fail with `SizeLimitExceeded` before
    /// being read; non-UTF-8 files fail with `NotText`.
    pub async fn create_version(&self, file: &Path) -> SnapshotResult<CreateOutcome> {
        let relative = self.normalize_path(file)?;
        let absolute = self.project_root.join(&relative);

        if let Some(limit) = self.config.max_file_size {
            let size = fs::metadata(&absolute).await?.len();
            if size > limit {
                return Err(SnapshotError::SizeLimitExceeded {
                    path: relative,
                    size,
                    limit,
                });
            }
        }

        let bytes = fs::read(&absolute).await?;
        let content =
            String::from_utf8(bytes).map_err(|_| SnapshotError::NotText(relative.clone()))?;

        self.record(&relative, &content).await
    }

    /// Record `content` as the newest version of `file`.
    ///
    /// Nothing is persisted when `content` equals the current version.
    pub async fn record(&self, file: &Path, content: &str) -> SnapshotResult<CreateOutcome> {
        let relative = self.normalize_path(file)?;
        let chain = self.load(&relative).await?.unwrap_or_default();
        let parent = chain.current().cloned();

        // Reconstruction and diffing are CPU-bound; keep them off the runtime workers.
        let content = content.to_owned();
        let timestamp = Utc::now().timestamp_millis();
        let (chain, recorded) = tokio::task::spawn_blocking(move || {
            let mut chain = chain;
            let recorded = chain.record(&content, timestamp);
            (chain, recorded)
        })
        .await?;

        let Some(id) = recorded? else {
            debug!(path = %relative.display(), "Content matches current version");
            return Ok(CreateOutcome::Unchanged);
        };

        self.save(&relative, &chain).await?;

        info!(path = %relative.display(), id = %id, "Recorded version");
        Ok(match parent {
            None => CreateOutcome::Root(id),
            Some(parent) => CreateOutcome::Appended { id, parent },
        })
    }

    /// Move the file's current pointer to `target` and return that version's content.
    ///
    /// The caller is responsible for writing the content back to disk.
    pub async fn restore(&self, file: &Path, target: &VersionId) -> SnapshotResult<String> {
        let relative = self.normalize_path(file)?;
        let mut chain = self
            .load(&relative)
            .await?
            .ok_or_else(|| SnapshotError::version_not_found(target))?;

        let unchanged = chain.current() == Some(target);
        let content = chain.pivot(target)?;
        if !unchanged {
            self.save(&relative, &chain).await?;
        }

        info!(path = %relative.display(), id = %target, "Restored version");
        Ok(content)
    }

    /// Content of the file's current version, if it has history.
    pub async fn current_content(&self, file: &Path) -> SnapshotResult<Option<String>> {
        match self.load(file).await? {
            Some(chain) => chain.current_content(),
            None => Ok(None),
        }
    }

    /// Load the chain of a file.
    ///
    /// Returns `None` when the file has no artifact.
    pub async fn load(&self, file: &Path) -> SnapshotResult<Option<SnapshotChain>> {
        let relative = self.normalize_path(file)?;
        let parts = artifact_key(&relative)?;
        let key: Vec<&str> = parts.iter().map(String::as_str).collect();

        let Some(bytes) = self.storage.read(&key).await? else {
            return Ok(None);
        };

        decode(&bytes)
            .map(Some)
            .map_err(|source| SnapshotError::StoreCorrupt {
                path: relative,
                source,
            })
    }

    /// Relative paths of every file with an artifact, sorted.
    pub async fn tracked_files(&self) -> SnapshotResult<Vec<PathBuf>> {
        let keys = self.storage.list(&[]).await?;
        Ok(keys
            .into_iter()
            .map(|key| key.iter().collect::<PathBuf>())
            .collect())
    }

    /// Size in bytes of a file's persisted artifact.
    pub async fn artifact_size(&self, file: &Path) -> SnapshotResult<Option<u64>> {
        let relative = self.normalize_path(file)?;
        let parts = artifact_key(&relative)?;
        let key: Vec<&str> = parts.iter().map(String::as_str).collect();
        Ok(self.storage.size(&key).await?)
    }

    /// Discard every artifact.
    pub async fn clear(&self) -> SnapshotResult<()> {
        self.storage.clear().await?;
        info!(root = %self.project_root.display(), "Cleared version store");
        Ok(())
    }

    /// Normalize a file path to be relative to the project root.
    pub fn normalize_path(&self, file: &Path) -> SnapshotResult<PathBuf> {
        path::relative_to(file, &self.project_root)
            .ok_or_else(|| SnapshotError::InvalidPath(file.to_path_buf()))
    }

    async fn save(&self, relative: &Path, chain: &SnapshotChain) -> SnapshotResult<()> {
        let bytes = encode(chain)?;
        let parts = artifact_key(relative)?;
        let key: Vec<&str> = parts.iter().map(String::as_str).collect();
        self.storage.write(&key, &bytes).await?;
        debug!(path = %relative.display(), bytes = bytes.len(), "Persisted chain");
        Ok(())
    }
}

fn artifact_key(relative: &Path) -> SnapshotResult<Vec<String>> {
    path::components(relative).ok_or_else(|| SnapshotError::InvalidPath(relative.to_path_buf()))
}
