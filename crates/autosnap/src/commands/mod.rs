//! Command handlers for the autosnap CLI.
//!
//! Each handler opens the project, runs one workspace operation and
//! prints a plain-text report.

pub mod clear;
pub mod history;
pub mod init;
pub mod logging;
pub mod restore;
pub mod settings;
pub mod start;

pub use clear::*;
pub use history::*;
pub use init::*;
pub use logging::*;
pub use restore::*;
pub use settings::*;
pub use start::*;

use autosnap_core::Workspace;
use std::path::Path;

/// Open a project that already has a version store.
///
/// Prints a hint and returns `None` when there is nothing recorded yet.
pub(crate) async fn open_existing(root: &Path) -> anyhow::Result<Option<Workspace>> {
    if !tokio::fs::try_exists(autosnap_util::path::store_dir(root)).await? {
        println!("No snapshots found. Run `autosnap init` first.");
        return Ok(None);
    }
    Ok(Some(Workspace::open(root).await?))
}
