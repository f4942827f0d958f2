//! Patch-chain version store for autosnap.
//!
//! Every tracked file owns one [`SnapshotChain`]: a tree of versions whose
//! root carries the full body and whose descendants carry forward patches
//! from their parent. A current pointer marks the last recorded (or
//! restored) state. Chains are persisted one artifact per file, as compact
//! JSON compressed with gzip.
//!
//! This crate provides:
//! - Recording a new version when the file content moved away from the current one
//! - Reconstructing any version by replaying patches from the root
//! - Restoring by pivoting the current pointer onto an existing version
//! - Read-only history views for reporting
//!
//! # Example
//!
//! ```no_run
//! use autosnap_snapshot::{SnapshotStore, StoreConfig};
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SnapshotStore::new(PathBuf::from("/project/root"), StoreConfig::default()).await?;
//!
//! // Record the file's current content
//! let outcome = store.create_version(Path::new("src/main.rs")).await?;
//!
//! // ... edit the file, record again ...
//!
//! // Restore if needed and write the content back
//! if let Some(id) = outcome.id() {
//!     let content = store.restore(Path::new("src/main.rs"), id).await?;
//!     tokio::fs::write("/project/root/src/main.rs", content).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod chain;
mod codec;
mod error;
mod history;
mod patch;
mod store;

pub use chain::{SnapshotChain, VersionId, VersionNode};
pub use codec::{decode, encode, CodecError};
pub use error::{SnapshotError, SnapshotResult};
pub use history::{raw_sizes, FileHistory, HistoryEntry, RawSizeReport, StorageReport};
pub use patch::{Patch, PatchError, PatchOp};
pub use store::{CreateOutcome, SnapshotStore, StoreConfig};
