//! Autosnap - automatic local version history.
//!
//! This is the main entry point for the autosnap CLI.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "autosnap")]
#[command(author, version, about = "Automatic local version history for your files", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize autosnap and record every tracked file
    Init,
    /// Watch the project and record meaningful changes until Ctrl-C
    Start,
    /// Show tracked files, or the versions of files matching a pattern
    History {
        /// Substring of the file path to show in detail
        file: Option<String>,
    },
    /// Restore files to a recorded version
    Restore {
        /// Version ID (see `autosnap history <file>`)
        id: String,
        /// Only restore files whose path contains this substring
        file: Option<String>,
    },
    /// Discard all recorded history
    Clear,
    /// Show the active configuration
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("Project root {} does not exist", root.display()))?;

    // The watcher logs to a file inside the project; other commands log to stderr
    let log_file = matches!(cli.command, Commands::Start)
        .then(|| autosnap_util::path::watch_log_path(&root));
    let log_file = init_logging(cli.verbose, log_file);

    match cli.command {
        Commands::Init => run_init(&root).await,
        Commands::Start => run_start(&root, log_file).await,
        Commands::History { file } => run_history(&root, file.as_deref()).await,
        Commands::Restore { id, file } => run_restore(&root, &id, file.as_deref()).await,
        Commands::Clear => run_clear(&root).await,
        Commands::Settings => run_settings(&root).await,
    }
}
