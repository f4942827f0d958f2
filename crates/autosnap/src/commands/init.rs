//! `autosnap init`.

use autosnap_core::Workspace;
use autosnap_util::path;
use std::path::Path;

/// Initialize the project and record every tracked file.
pub async fn run_init(root: &Path) -> anyhow::Result<()> {
    println!("Initializing autosnap in {}...", root.display());
    let report = Workspace::init(root).await?;

    if !report.created {
        println!("Autosnap is already initialized.");
        return Ok(());
    }

    println!("Config created at {}", path::config_path(root).display());
    let scan = &report.scan;
    println!(
        "Initial snapshots complete: {} recorded, {} skipped, {} failed.",
        scan.recorded,
        scan.skipped,
        scan.failed.len()
    );
    for failure in &scan.failed {
        eprintln!("  {}: {}", failure.path.display(), failure.message);
    }

    Ok(())
}
