//! Storage layer for autosnap.
//!
//! This crate provides a key-value storage abstraction for version-store
//! artifacts with two backends:
//! - File storage (default), one file per key with atomic replacement
//! - In-memory storage (for testing)

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;

/// A trait for artifact storage backends.
///
/// Keys are represented as path segments, e.g., `["src", "main.rs"]`.
/// Values are opaque byte blobs.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a value from storage.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn read(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>>;

    /// Write a value to storage.
    ///
    /// Creates parent directories if necessary. The previous value stays
    /// readable until the new one fully replaces it.
    async fn write(&self, key: &[&str], value: &[u8]) -> StorageResult<()>;

    /// Remove a value from storage.
    async fn remove(&self, key: &[&str]) -> StorageResult<()>;

    /// List all keys under a prefix, at any depth, in sorted order.
    ///
    /// Returns the full key paths for each item.
    async fn list(&self, prefix: &[&str]) -> StorageResult<Vec<Vec<String>>>;

    /// Check if a key exists.
    async fn exists(&self, key: &[&str]) -> StorageResult<bool>;

    /// Size in bytes of the stored value, if present.
    async fn size(&self, key: &[&str]) -> StorageResult<Option<u64>>;

    /// Remove every stored value.
    async fn clear(&self) -> StorageResult<()>;
}

/// Validate key components (no path traversal).
pub(crate) fn validate_key(key: &[&str]) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key("Key cannot be empty"));
    }

    for component in key {
        if component.is_empty()
            || component.contains('/')
            || component.contains('\\')
            || *component == "."
            || *component == ".."
        {
            return Err(StorageError::invalid_key(format!(
                "Invalid key component: {}",
                component
            )));
        }
    }

    Ok(())
}
