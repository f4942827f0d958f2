//! Shared utilities for autosnap.
//!
//! This crate provides common utilities used across the autosnap workspace:
//! - Monotonic ULID-based version identifiers
//! - Logging setup with tracing
//! - Project layout paths (`.auto-snap/`, store and config locations)
//! - RAII-based timing for operation measurement

pub mod id;
pub mod log;
pub mod path;
pub mod timing;

pub use id::Identifier;
pub use timing::TimingGuard;
