//! File-based artifact storage.
//!
//! Each key is stored as a separate file under the base directory, with the
//! artifact extension appended to the last segment:
//! `["src", "main.rs"]` -> `src/main.rs.snap`

use crate::{validate_key, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use autosnap_util::path::ARTIFACT_EXTENSION;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// File-based storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Base directory of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the file path for a key.
    fn key_to_path(&self, key: &[&str]) -> StorageResult<PathBuf> {
        validate_key(key)?;

        let mut path = self.base_path.clone();
        let (last, parents) = key
            .split_last()
            .ok_or_else(|| StorageError::invalid_key("Key cannot be empty"))?;
        for component in parents {
            path.push(component);
        }
        path.push(format!("{last}.{ARTIFACT_EXTENSION}"));

        Ok(path)
    }

    /// Get the directory path for a prefix.
    fn prefix_to_dir(&self, prefix: &[&str]) -> PathBuf {
        let mut path = self.base_path.clone();
        for component in prefix {
            path.push(component);
        }
        path
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn read(&self, key: &[&str]) -> StorageResult<Option<Vec<u8>>> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Reading from storage");

        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn write(&self, key: &[&str], value: &[u8]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), bytes = value.len(), "Writing to storage");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically (write to temp file, then rename)
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(value).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        Ok(())
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Removing from storage");

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn list(&self, prefix: &[&str]) -> StorageResult<Vec<Vec<String>>> {
        let dir = self.prefix_to_dir(prefix);
        debug!(path = %dir.display(), "Listing storage");

        let suffix = format!(".{ARTIFACT_EXTENSION}");
        let mut results = Vec::new();
        let base: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
        let mut pending = vec![(dir, base)];

        while let Some((dir, key)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io(e)),
            };

            while let Some(entry) = entries.next_entry().await? {
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    let mut child = key.clone();
                    child.push(name);
                    pending.push((entry.path(), child));
                } else if let Some(stem) = name.strip_suffix(&suffix) {
                    if stem.is_empty() {
                        continue;
                    }
                    let mut item = key.clone();
                    item.push(stem.to_string());
                    results.push(item);
                }
            }
        }

        results.sort();
        Ok(results)
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn size(&self, key: &[&str]) -> StorageResult<Option<u64>> {
        let path = self.key_to_path(key)?;
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn clear(&self) -> StorageResult<()> {
        debug!(path = %self.base_path.display(), "Clearing storage");

        match fs::remove_dir_all(&self.base_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::Io(e)),
        }
        fs::create_dir_all(&self.base_path).await?;

        Ok(())
    }
}
