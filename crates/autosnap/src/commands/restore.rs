//! `autosnap restore`.

use super::open_existing;
use autosnap_snapshot::VersionId;
use std::path::Path;

/// Restore every matching file that has the given version.
pub async fn run_restore(root: &Path, id: &str, pattern: Option<&str>) -> anyhow::Result<()> {
    let Some(workspace) = open_existing(root).await? else {
        return Ok(());
    };

    let target = VersionId::from_string(id);
    println!("Restoring to version ID: {target}...");
    let report = workspace.restore(&target, pattern).await?;

    for restored in &report.restored {
        println!("Restored {}", restored.display());
    }
    for failure in &report.failed {
        eprintln!("Failed to restore {}: {}", failure.path.display(), failure.message);
    }

    if report.is_empty() {
        println!("Version {target} not found in any matching files.");
    } else {
        println!();
        println!(
            "Summary: {} restored, {} failed.",
            report.restored.len(),
            report.failed.len()
        );
    }

    Ok(())
}
