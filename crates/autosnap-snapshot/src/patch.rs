//! Forward patches between two versions of a text.

use autosnap_diff::line_diff;
use serde::{Deserialize, Serialize};
use similar::ChangeTag;
use thiserror::Error;

/// One step of a patch, measured in bytes of the parent content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchOp {
    /// Keep the next `n` bytes of the parent.
    #[serde(rename = "=")]
    Copy(usize),
    /// Skip the next `n` bytes of the parent.
    #[serde(rename = "-")]
    Delete(usize),
    /// Emit new text.
    #[serde(rename = "+")]
    Insert(String),
}

/// Errors raised when a patch does not fit its parent content.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// An operation reaches past the end of the parent or splits a character.
    #[error("patch range {offset}..{offset}+{len} does not fit a parent of {base_len} bytes")]
    OutOfRange {
        offset: usize,
        len: usize,
        base_len: usize,
    },

    /// The patch did not consume the whole parent.
    #[error("patch consumed {consumed} of {base_len} parent bytes")]
    LengthMismatch { consumed: usize, base_len: usize },
}

/// A forward patch turning a parent's content into a child's content.
///
/// Built from a line-level diff; applying it to the exact parent content it
/// was computed from reproduces the child byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

impl Patch {
    /// Compute the patch from `old` to `new`.
    pub fn between(old: &str, new: &str) -> Self {
        let diff = line_diff(old, new);
        let mut patch = Patch::default();

        for change in diff.iter_all_changes() {
            let value = change.value();
            match change.tag() {
                ChangeTag::Equal => patch.push(PatchOp::Copy(value.len())),
                ChangeTag::Delete => patch.push(PatchOp::Delete(value.len())),
                ChangeTag::Insert => patch.push(PatchOp::Insert(value.to_string())),
            }
        }

        patch
    }

    /// Operations in application order.
    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    /// Whether applying this patch leaves the content unchanged.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, PatchOp::Copy(_)))
    }

    /// Apply the patch to the parent content.
    pub fn apply(&self, base: &str) -> Result<String, PatchError> {
        let mut output = String::with_capacity(base.len());
        let mut offset = 0;

        for op in &self.ops {
            match op {
                PatchOp::Copy(len) => {
                    output.push_str(slice(base, offset, *len)?);
                    offset += len;
                }
                PatchOp::Delete(len) => {
                    slice(base, offset, *len)?;
                    offset += len;
                }
                PatchOp::Insert(text) => output.push_str(text),
            }
        }

        if offset != base.len() {
            return Err(PatchError::LengthMismatch {
                consumed: offset,
                base_len: base.len(),
            });
        }

        Ok(output)
    }

    /// Append an operation, merging it into the previous one when they match.
    fn push(&mut self, op: PatchOp) {
        let merged = match (self.ops.last_mut(), &op) {
            (_, PatchOp::Copy(0) | PatchOp::Delete(0)) => true,
            (Some(PatchOp::Copy(prev)), PatchOp::Copy(len)) => {
                *prev += len;
                true
            }
            (Some(PatchOp::Delete(prev)), PatchOp::Delete(len)) => {
                *prev += len;
                true
            }
            (Some(PatchOp::Insert(prev)), PatchOp::Insert(text)) => {
                prev.push_str(text);
                true
            }
            _ => false,
        };
        if !merged {
            self.ops.push(op);
        }
    }
}

fn slice(base: &str, offset: usize, len: usize) -> Result<&str, PatchError> {
    offset
        .checked_add(len)
        .and_then(|end| base.get(offset..end))
        .ok_or(PatchError::OutOfRange {
            offset,
            len,
            base_len: base.len(),
        })
}
