//! Read-only history views.

use crate::{SnapshotChain, SnapshotResult, SnapshotStore, VersionId, VersionNode};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The recorded history of one tracked file.
#[derive(Debug, Clone)]
pub struct FileHistory {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// Current version.
    pub current_id: VersionId,
    /// Reconstructed content of the current version.
    pub current_content: String,
    /// Every recorded version.
    pub nodes: BTreeMap<VersionId, VersionNode>,
}

/// One row of a history listing.
#[derive(Debug, Clone, Copy)]
pub struct HistoryEntry<'a> {
    pub id: &'a VersionId,
    pub node: &'a VersionNode,
    pub is_current: bool,
}

impl FileHistory {
    /// Number of recorded versions.
    pub fn version_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node the current pointer refers to.
    pub fn current_node(&self) -> Option<&VersionNode> {
        self.nodes.get(&self.current_id)
    }

    /// All versions, newest first.
    pub fn entries(&self) -> Vec<HistoryEntry<'_>> {
        let mut entries: Vec<_> = self
            .nodes
            .iter()
            .map(|(id, node)| HistoryEntry {
                id,
                node,
                is_current: *id == self.current_id,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.node
                .timestamp()
                .cmp(&a.node.timestamp())
                .then_with(|| b.id.cmp(a.id))
        });
        entries
    }
}

/// Uncompressed size of every version in a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSizeReport {
    /// Reconstructed content length in bytes, per version.
    pub per_node: BTreeMap<VersionId, usize>,
    /// Sum over all versions.
    pub total: u64,
}

/// Raw sizes next to the size of the persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageReport {
    pub raw: RawSizeReport,
    pub compressed: u64,
}

impl StorageReport {
    /// Bytes saved by storing patches compressed instead of full copies.
    pub fn saved(&self) -> u64 {
        self.raw.total.saturating_sub(self.compressed)
    }
}

/// Reconstruct every version of a chain and measure it.
pub fn raw_sizes(chain: &SnapshotChain) -> SnapshotResult<RawSizeReport> {
    let mut report = RawSizeReport::default();
    for id in chain.nodes().keys() {
        let len = chain.reconstruct(id)?.len();
        report.total += len as u64;
        report.per_node.insert(id.clone(), len);
    }
    Ok(report)
}

impl SnapshotStore {
    /// Read the history of a file.
    ///
    /// Returns `None` when the file has never been recorded.
    pub async fn read_history(&self, file: &Path) -> SnapshotResult<Option<FileHistory>> {
        let relative = self.normalize_path(file)?;
        let Some(chain) = self.load(&relative).await? else {
            return Ok(None);
        };
        let Some(current_content) = chain.current_content()? else {
            return Ok(None);
        };

        let (current, nodes) = chain.into_parts();
        let Some(current_id) = current else {
            return Ok(None);
        };

        Ok(Some(FileHistory {
            path: relative,
            current_id,
            current_content,
            nodes,
        }))
    }

    /// Raw and compressed storage figures for a file.
    pub async fn storage_report(&self, file: &Path) -> SnapshotResult<Option<StorageReport>> {
        let Some(chain) = self.load(file).await? else {
            return Ok(None);
        };
        let raw = raw_sizes(&chain)?;
        let compressed = self.artifact_size(file).await?.unwrap_or(0);
        Ok(Some(StorageReport { raw, compressed }))
    }
}
