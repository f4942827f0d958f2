//! `autosnap clear`.

use super::open_existing;
use std::path::Path;

/// Discard all recorded history.
pub async fn run_clear(root: &Path) -> anyhow::Result<()> {
    let Some(workspace) = open_existing(root).await? else {
        return Ok(());
    };

    println!("Clearing all snapshots...");
    workspace.clear().await?;
    println!("History cleared successfully.");
    Ok(())
}
