//! In-memory storage, used by store tests.

use crate::{validate_key, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Artifacts = BTreeMap<Vec<String>, Vec<u8>>;

/// Non-persistent storage keyed by owned path segments.
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<Artifacts>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn artifacts(&self) -> StorageResult<RwLockReadGuard<'_, Artifacts>> {
        self.data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }

    fn artifacts_mut(&self) -> StorageResult<RwLockWriteGuard<'_, Artifacts>> {
        self.data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

fn owned(key: &[&str]) -> Vec<String> {
    key.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.artifacts()?.get(&owned(key)).cloned())
    }

    async fn write(&self, key: &[&str], value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.artifacts_mut()?.insert(owned(key), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<()> {
        self.artifacts_mut()?.remove(&owned(key));
        Ok(())
    }

    async fn list(&self, prefix: &[&str]) -> StorageResult<Vec<Vec<String>>> {
        Ok(self
            .artifacts()?
            .keys()
            .filter(|k| k.len() > prefix.len() && k.iter().zip(prefix).all(|(a, b)| a == b))
            .cloned()
            .collect())
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        Ok(self.artifacts()?.contains_key(&owned(key)))
    }

    async fn size(&self, key: &[&str]) -> StorageResult<Option<u64>> {
        Ok(self.artifacts()?.get(&owned(key)).map(|v| v.len() as u64))
    }

    async fn clear(&self) -> StorageResult<()> {
        self.artifacts_mut()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();

        storage.write(&["test", "data"], b"bytes").await.unwrap();

        let read = storage.read(&["test", "data"]).await.unwrap();
        assert_eq!(read.as_deref(), Some(&b"bytes"[..]));

        assert!(storage.exists(&["test", "data"]).await.unwrap());
        assert!(!storage.exists(&["nonexistent"]).await.unwrap());
        assert_eq!(storage.size(&["test", "data"]).await.unwrap(), Some(5));

        storage.remove(&["test", "data"]).await.unwrap();
        assert!(!storage.exists(&["test", "data"]).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_storage_list_includes_nested() {
        let storage = MemoryStorage::new();

        storage.write(&["project", "item1"], b"1").await.unwrap();
        storage.write(&["project", "nested", "item"], b"2").await.unwrap();
        storage.write(&["other", "item"], b"3").await.unwrap();

        let items = storage.list(&["project"]).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], vec!["project", "item1"]);

        let all = storage.list(&[]).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_memory_storage_overwrite_and_clear() {
        let storage = MemoryStorage::default();

        storage.write(&["key"], b"first").await.unwrap();
        storage.write(&["key"], b"second").await.unwrap();
        let read = storage.read(&["key"]).await.unwrap();
        assert_eq!(read.as_deref(), Some(&b"second"[..]));

        storage.clear().await.unwrap();
        assert!(storage.read(&["key"]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_storage_rejects_traversal() {
        let storage = MemoryStorage::new();
        assert!(storage.write(&["..", "escape"], b"x").await.is_err());
        assert!(storage.read(&[]).await.is_err());
    }
}
