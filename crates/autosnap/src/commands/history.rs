//! `autosnap history`.

use super::open_existing;
use autosnap_core::{HistoryReport, Workspace};
use autosnap_snapshot::{FileHistory, VersionNode};
use bytesize::ByteSize;
use chrono::{DateTime, Local};
use std::path::Path;

/// Show the tracked-file summary, or detailed versions when a pattern is given.
pub async fn run_history(root: &Path, pattern: Option<&str>) -> anyhow::Result<()> {
    let Some(workspace) = open_existing(root).await? else {
        return Ok(());
    };

    let report = workspace.history(pattern).await?;
    for failure in &report.failed {
        eprintln!(
            "Failed to read history for {}: {}",
            failure.path.display(),
            failure.message
        );
    }

    if report.files.is_empty() {
        println!("No matching snapshots found.");
        return Ok(());
    }

    match pattern {
        Some(pattern) => print_detailed(&workspace, &report, pattern).await,
        None => {
            print_summary(&report);
            Ok(())
        }
    }
}

fn print_summary(report: &HistoryReport) {
    println!("Tracked files:");
    println!("Use `autosnap history <file>` to see detailed versions.");
    println!();
    println!("{:<40} {:<20} {:>8}", "FILE", "LAST UPDATED", "VERSIONS");
    println!("{}", "-".repeat(70));

    for history in &report.files {
        let updated = history
            .current_node()
            .map(|node| format_timestamp(node.timestamp()))
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "{:<40} {:<20} {:>8}",
            history.path.display().to_string(),
            updated,
            history.version_count()
        );
    }
}

async fn print_detailed(
    workspace: &Workspace,
    report: &HistoryReport,
    pattern: &str,
) -> anyhow::Result<()> {
    println!("Snapshot history for \"{pattern}\":");

    for history in &report.files {
        println!();
        println!("File: {}", history.path.display());
        println!(
            "{:<30} {:<30} {:<20} {:<12} TYPE",
            "ID", "PARENT", "TIMESTAMP", "STATS"
        );
        println!("{}", "-".repeat(106));

        for entry in history.entries() {
            let parent = entry
                .node
                .parent()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            let head = if entry.is_current { " (HEAD)" } else { "" };
            println!(
                "{:<30} {:<30} {:<20} {:<12} {}{}",
                entry.id,
                parent,
                format_timestamp(entry.node.timestamp()),
                format_stats(entry.node),
                node_kind(entry.node),
                head
            );
        }

        print_storage(workspace, history).await?;
    }

    let newest = report
        .files
        .first()
        .and_then(|history| history.entries().first().map(|entry| entry.id.clone()));
    if let Some(newest) = newest {
        println!();
        println!("Tip: restore with `autosnap restore {newest} {pattern}`");
    }
    Ok(())
}

async fn print_storage(workspace: &Workspace, history: &FileHistory) -> anyhow::Result<()> {
    if let Some(storage) = workspace.storage_report(&history.path).await? {
        println!(
            "Storage: {} across {} versions, {} on disk ({} saved)",
            ByteSize::b(storage.raw.total),
            history.version_count(),
            ByteSize::b(storage.compressed),
            ByteSize::b(storage.saved())
        );
    }
    Ok(())
}

fn node_kind(node: &VersionNode) -> &'static str {
    if node.is_root() {
        "ROOT"
    } else {
        "VERSION"
    }
}

fn format_stats(node: &VersionNode) -> String {
    match node.stats() {
        Some(stats) => format!("+{} -{}", stats.added, stats.removed),
        None => String::new(),
    }
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|time| {
            time.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}
