//! Core coordination layer for autosnap.
//!
//! This crate ties the significance engine and the version store to a
//! project directory:
//! - Tracking policy loading and validation (`.auto-snap/config.json`)
//! - Include/exclude matching of project files
//! - Batch operations: init with initial scan, history, restore, clear

pub mod config;
pub mod error;
pub mod filter;
pub mod workspace;

pub use config::{RetentionPolicy, TrackingPolicy};
pub use error::{ConfigError, CoreError, CoreResult};
pub use filter::FileFilter;
pub use workspace::{
    FileFailure, HistoryReport, InitReport, RestoreReport, ScanReport, Workspace,
};
