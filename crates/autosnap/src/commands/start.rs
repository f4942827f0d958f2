//! `autosnap start`.

use autosnap_core::Workspace;
use autosnap_watch::start_watch;
use std::path::{Path, PathBuf};
use tracing::info;

/// Watch the project in the foreground until Ctrl-C.
pub async fn run_start(root: &Path, log_file: Option<PathBuf>) -> anyhow::Result<()> {
    let workspace = Workspace::open(root).await?;
    let handle = start_watch(&workspace)?;

    println!(
        "Watching {} (debounce {} ms). Press Ctrl-C to stop.",
        root.display(),
        workspace.policy().debounce
    );
    if let Some(log_file) = log_file {
        println!("Logging to {}", log_file.display());
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    println!("Stopping watcher...");
    handle.stop().await;
    println!("Watcher stopped.");
    Ok(())
}
