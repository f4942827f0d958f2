//! Version chain data structures.

use crate::{Patch, SnapshotError, SnapshotResult};
use autosnap_diff::{diff_stats, DiffStats};
use autosnap_util::Identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Unique identifier for a recorded version.
///
/// Ids sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// Create a new time-ordered version ID.
    pub fn new() -> Self {
        Self(Identifier::version())
    }

    /// Create a version ID from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// One recorded state of a tracked file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireNode", into = "WireNode")]
pub enum VersionNode {
    /// First version of the file, holding the full body.
    Root { timestamp: i64, body: String },
    /// Any later version, holding a forward patch from its parent.
    Delta {
        parent: VersionId,
        timestamp: i64,
        patch: Patch,
        stats: Option<DiffStats>,
    },
}

impl VersionNode {
    /// Creation time in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        match self {
            VersionNode::Root { timestamp, .. } | VersionNode::Delta { timestamp, .. } => {
                *timestamp
            }
        }
    }

    /// Creation time as a UTC date.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp())
    }

    /// Parent version, absent for the root.
    pub fn parent(&self) -> Option<&VersionId> {
        match self {
            VersionNode::Root { .. } => None,
            VersionNode::Delta { parent, .. } => Some(parent),
        }
    }

    /// Line statistics relative to the parent, if recorded.
    pub fn stats(&self) -> Option<DiffStats> {
        match self {
            VersionNode::Root { .. } => None,
            VersionNode::Delta { stats, .. } => *stats,
        }
    }

    /// Whether this node holds a full body.
    pub fn is_root(&self) -> bool {
        matches!(self, VersionNode::Root { .. })
    }
}

/// Persisted shape of a node, using single-letter keys.
#[derive(Serialize, Deserialize)]
struct WireNode {
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    parent: Option<VersionId>,
    #[serde(rename = "t")]
    timestamp: i64,
    #[serde(rename = "b", default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
    patch: Option<Patch>,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    stats: Option<(usize, usize)>,
}

impl TryFrom<WireNode> for VersionNode {
    type Error = String;

    fn try_from(wire: WireNode) -> Result<Self, Self::Error> {
        match (wire.body, wire.parent, wire.patch) {
            (Some(body), None, None) => Ok(VersionNode::Root {
                timestamp: wire.timestamp,
                body,
            }),
            (None, Some(parent), Some(patch)) => Ok(VersionNode::Delta {
                parent,
                timestamp: wire.timestamp,
                patch,
                stats: wire
                    .stats
                    .map(|(added, removed)| DiffStats { added, removed }),
            }),
            _ => Err("node must carry either a body, or a parent and a patch".to_string()),
        }
    }
}

impl From<VersionNode> for WireNode {
    fn from(node: VersionNode) -> Self {
        match node {
            VersionNode::Root { timestamp, body } => WireNode {
                parent: None,
                timestamp,
                body: Some(body),
                patch: None,
                stats: None,
            },
            VersionNode::Delta {
                parent,
                timestamp,
                patch,
                stats,
            } => WireNode {
                parent: Some(parent),
                timestamp,
                body: None,
                patch: Some(patch),
                stats: stats.map(|s| (s.added, s.removed)),
            },
        }
    }
}

/// All versions of one tracked file plus the current pointer.
///
/// Nodes live in a flat map keyed by id; parent links are resolved by
/// lookup, so the tree never owns its own back-references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotChain {
    #[serde(rename = "c")]
    current: Option<VersionId>,
    #[serde(rename = "i")]
    nodes: BTreeMap<VersionId, VersionNode>,
}

impl SnapshotChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no version has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of recorded versions.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The current pointer.
    pub fn current(&self) -> Option<&VersionId> {
        self.current.as_ref()
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> &BTreeMap<VersionId, VersionNode> {
        &self.nodes
    }

    /// Look up one node.
    pub fn get(&self, id: &VersionId) -> Option<&VersionNode> {
        self.nodes.get(id)
    }

    /// Whether the chain contains a version.
    pub fn contains(&self, id: &VersionId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Direct children of a version.
    pub fn children<'a>(&'a self, id: &'a VersionId) -> impl Iterator<Item = &'a VersionId> + 'a {
        self.nodes
            .iter()
            .filter(move |(_, node)| node.parent() == Some(id))
            .map(|(child, _)| child)
    }

    /// Split into the current pointer and the node map.
    pub fn into_parts(self) -> (Option<VersionId>, BTreeMap<VersionId, VersionNode>) {
        (self.current, self.nodes)
    }

    /// Record `content` as a new version stamped with `timestamp` (epoch ms).
    ///
    /// The first call creates the root. Later calls append a child of the
    /// current version and advance the pointer, unless `content` equals the
    /// current version's content, in which case nothing changes and `None`
    /// is returned.
    pub fn record(&mut self, content: &str, timestamp: i64) -> SnapshotResult<Option<VersionId>> {
        let Some(parent) = self.current.clone() else {
            let id = self.fresh_id();
            self.nodes.insert(
                id.clone(),
                VersionNode::Root {
                    timestamp,
                    body: content.to_string(),
                },
            );
            self.current = Some(id.clone());
            return Ok(Some(id));
        };

        let parent_content = self.reconstruct(&parent)?;
        let patch = Patch::between(&parent_content, content);
        if patch.is_identity() {
            return Ok(None);
        }

        let id = self.fresh_id();
        self.nodes.insert(
            id.clone(),
            VersionNode::Delta {
                parent,
                timestamp,
                patch,
                stats: Some(diff_stats(&parent_content, content)),
            },
        );
        self.current = Some(id.clone());
        Ok(Some(id))
    }

    /// Move the current pointer onto an existing version and return its content.
    ///
    /// No node is added or removed.
    pub fn pivot(&mut self, target: &VersionId) -> SnapshotResult<String> {
        let content = self.reconstruct(target)?;
        self.current = Some(target.clone());
        Ok(content)
    }

    /// Content of the current version, if any.
    pub fn current_content(&self) -> SnapshotResult<Option<String>> {
        self.current
            .as_ref()
            .map(|id| self.reconstruct(id))
            .transpose()
    }

    /// Rebuild the content of a version.
    ///
    /// Walks parent links up to the nearest node holding a full body, then
    /// replays the patches back down to `target`.
    pub fn reconstruct(&self, target: &VersionId) -> SnapshotResult<String> {
        let mut node = self
            .nodes
            .get(target)
            .ok_or_else(|| SnapshotError::version_not_found(target))?;

        let mut patches = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(target);

        let mut content = loop {
            match node {
                VersionNode::Root { body, .. } => break body.clone(),
                VersionNode::Delta { parent, patch, .. } => {
                    patches.push(patch);
                    if !visited.insert(parent) {
                        return Err(SnapshotError::corrupt_chain(format!(
                            "cycle through {parent} while resolving {target}"
                        )));
                    }
                    node = self.nodes.get(parent).ok_or_else(|| {
                        SnapshotError::corrupt_chain(format!(
                            "missing parent {parent} while resolving {target}"
                        ))
                    })?;
                }
            }
        };

        for patch in patches.into_iter().rev() {
            content = patch.apply(&content)?;
        }

        Ok(content)
    }

    /// Check that a non-empty chain has exactly one root and a current
    /// pointer into its node map.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let roots = self.nodes.values().filter(|node| node.is_root()).count();
        if !self.nodes.is_empty() && roots != 1 {
            return Err(format!("chain has {roots} root versions, expected exactly one"));
        }

        match &self.current {
            None if !self.nodes.is_empty() => {
                Err("chain has versions but no current pointer".to_string())
            }
            Some(id) if !self.nodes.contains_key(id) => {
                Err(format!("current pointer {id} is not in the chain"))
            }
            _ => Ok(()),
        }
    }

    /// Generate an id not yet used in this chain.
    fn fresh_id(&self) -> VersionId {
        loop {
            let id = VersionId::new();
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, id: VersionId, node: VersionNode) {
        self.nodes.insert(id, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chain: &mut SnapshotChain, content: &str) -> VersionId {
        chain.record(content, 1_700_000_000_000).unwrap().unwrap()
    }

    #[test]
    fn test_first_record_creates_root() {
        let mut chain = SnapshotChain::new();
        let root = record(&mut chain, "v1");

        assert_eq!(chain.current(), Some(&root));
        assert_eq!(chain.len(), 1);
        assert!(chain.get(&root).unwrap().is_root());
        assert_eq!(chain.reconstruct(&root).unwrap(), "v1");
    }

    #[test]
    fn test_every_recorded_version_reconstructs() {
        let contents = [
            "fn main() {}\n",
            "fn main() {\n    println!(\"hi\");\n}\n",
            "fn main() {\n    println!(\"hello\");\n}\n",
            "",
            "// rewritten\nfn main() {\n    run();\n}\n",
            "// rewritten\nfn main() {\n    run();\n}\n// trailing",
        ];
        let mut chain = SnapshotChain::new();
        let ids: Vec<VersionId> = contents.iter().map(|c| record(&mut chain, c)).collect();

        for (id, expected) in ids.iter().zip(contents) {
            assert_eq!(chain.reconstruct(id).unwrap(), expected);
        }
        for pair in ids.windows(2) {
            assert_eq!(chain.get(&pair[1]).unwrap().parent(), Some(&pair[0]));
        }
    }

    #[test]
    fn test_identical_content_is_noop() {
        let mut chain = SnapshotChain::new();
        let root = record(&mut chain, "same");
        let before = chain.clone();

        assert_eq!(chain.record("same", 1).unwrap(), None);
        assert_eq!(chain, before);
        assert_eq!(chain.current(), Some(&root));
    }

    #[test]
    fn test_pivot_is_pointer_move_and_branches() {
        let mut chain = SnapshotChain::new();
        let root = record(&mut chain, "v1\n");
        let first = record(&mut chain, "v1\nfirst branch\n");

        let restored = chain.pivot(&root).unwrap();
        assert_eq!(restored, "v1\n");
        assert_eq!(chain.current(), Some(&root));
        assert_eq!(chain.len(), 2);

        // Same content as the pivot target: nothing to record.
        assert_eq!(chain.record("v1\n", 2).unwrap(), None);

        let second = record(&mut chain, "v1\nsecond branch\n");
        assert_eq!(chain.get(&second).unwrap().parent(), Some(&root));
        let mut children: Vec<_> = chain.children(&root).cloned().collect();
        children.sort();
        assert_eq!(children, vec![first.clone(), second.clone()]);
        assert_eq!(chain.reconstruct(&first).unwrap(), "v1\nfirst branch\n");
        assert_eq!(chain.reconstruct(&second).unwrap(), "v1\nsecond branch\n");
    }

    #[test]
    fn test_reconstruct_unknown_version() {
        let mut chain = SnapshotChain::new();
        record(&mut chain, "v1");
        let err = chain
            .reconstruct(&VersionId::from_string("ver_missing"))
            .unwrap_err();
        assert!(err.is_version_not_found());
        assert!(chain.pivot(&VersionId::from_string("ver_missing")).is_err());
    }

    #[test]
    fn test_reconstruct_missing_parent_is_corrupt() {
        let mut chain = SnapshotChain::new();
        let orphan = VersionId::from_string("ver_orphan");
        chain.insert_raw(
            orphan.clone(),
            VersionNode::Delta {
                parent: VersionId::from_string("ver_gone"),
                timestamp: 0,
                patch: Patch::between("a", "b"),
                stats: None,
            },
        );
        assert!(matches!(
            chain.reconstruct(&orphan),
            Err(SnapshotError::CorruptChain(_))
        ));
    }

    #[test]
    fn test_reconstruct_cycle_is_corrupt() {
        let mut chain = SnapshotChain::new();
        let a = VersionId::from_string("ver_a");
        let b = VersionId::from_string("ver_b");
        let patch = Patch::between("x", "y");
        chain.insert_raw(
            a.clone(),
            VersionNode::Delta {
                parent: b.clone(),
                timestamp: 0,
                patch: patch.clone(),
                stats: None,
            },
        );
        chain.insert_raw(
            b,
            VersionNode::Delta {
                parent: a.clone(),
                timestamp: 0,
                patch,
                stats: None,
            },
        );
        assert!(matches!(
            chain.reconstruct(&a),
            Err(SnapshotError::CorruptChain(_))
        ));
    }

    #[test]
    fn test_bad_patch_is_corrupt() {
        let mut chain = SnapshotChain::new();
        let root = record(&mut chain, "short");
        let child = VersionId::from_string("ver_zzz");
        chain.insert_raw(
            child.clone(),
            VersionNode::Delta {
                parent: root,
                timestamp: 0,
                patch: Patch::between("a much longer parent\n", "x"),
                stats: None,
            },
        );
        assert!(matches!(
            chain.reconstruct(&child),
            Err(SnapshotError::CorruptChain(_))
        ));
    }

    #[test]
    fn test_stats_recorded_on_delta() {
        let mut chain = SnapshotChain::new();
        record(&mut chain, "a\nb\nc\n");
        let id = record(&mut chain, "a\nb\nc\nd\n");
        assert_eq!(
            chain.get(&id).unwrap().stats(),
            Some(DiffStats {
                added: 1,
                removed: 0
            })
        );
    }

    #[test]
    fn test_validate() {
        let mut chain = SnapshotChain::new();
        assert!(chain.validate().is_ok());
        record(&mut chain, "v1");
        assert!(chain.validate().is_ok());
        chain.current = Some(VersionId::from_string("ver_elsewhere"));
        assert!(chain.validate().is_err());
    }
}
