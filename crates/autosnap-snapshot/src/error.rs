//! Snapshot error types.

use crate::{CodecError, PatchError, VersionId};
use autosnap_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The requested version is not part of the chain.
    #[error("Version not found: {0}")]
    VersionNotFound(VersionId),

    /// The chain cannot be replayed (missing parent, cycle, or bad patch).
    #[error("Corrupt chain: {0}")]
    CorruptChain(String),

    /// The persisted artifact could not be decompressed or parsed.
    #[error("Store artifact for {} is corrupt: {source}", path.display())]
    StoreCorrupt {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The file is larger than the configured ceiling.
    #[error("File {} is {size} bytes, over the {limit} byte limit", path.display())]
    SizeLimitExceeded { path: PathBuf, size: u64, limit: u64 },

    /// The file is not valid UTF-8 text.
    #[error("File {} is not valid UTF-8 text", .0.display())]
    NotText(PathBuf),

    /// The path is outside the project root or not a plain relative path.
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A blocking diff task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SnapshotError {
    /// Create a version not found error.
    pub fn version_not_found(id: &VersionId) -> Self {
        Self::VersionNotFound(id.clone())
    }

    /// Create a corrupt chain error.
    pub fn corrupt_chain(message: impl Into<String>) -> Self {
        Self::CorruptChain(message.into())
    }

    /// Whether this error only means the version is absent.
    pub fn is_version_not_found(&self) -> bool {
        matches!(self, Self::VersionNotFound(_))
    }
}

impl From<PatchError> for SnapshotError {
    fn from(err: PatchError) -> Self {
        Self::CorruptChain(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_found_display() {
        let err = SnapshotError::version_not_found(&VersionId::from_string("ver_abc"));
        assert_eq!(err.to_string(), "Version not found: ver_abc");
        assert!(err.is_version_not_found());
    }

    #[test]
    fn test_patch_error_is_corrupt_chain() {
        let err: SnapshotError = PatchError::LengthMismatch {
            consumed: 3,
            base_len: 5,
        }
        .into();
        assert!(matches!(err, SnapshotError::CorruptChain(_)));
        assert!(!err.is_version_not_found());
    }

    #[test]
    fn test_size_limit_display() {
        let err = SnapshotError::SizeLimitExceeded {
            path: PathBuf::from("big.bin"),
            size: 10,
            limit: 5,
        };
        assert_eq!(
            err.to_string(),
            "File big.bin is 10 bytes, over the 5 byte limit"
        );
    }
}
