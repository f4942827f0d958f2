//! Change-significance engine for autosnap.
//!
//! Pure functions over two text contents that decide whether an edit is
//! worth recording as a new version:
//!
//! 1. Trivial changes (too few changed lines *and* characters) are dropped.
//! 2. Whitespace-only changes are dropped when the policy asks for it.
//! 3. Changes leaving the file nearly identical (line similarity at or above
//!    the threshold) are dropped.
//!
//! # Example
//!
//! ```
//! use autosnap_diff::{is_meaningful, Thresholds};
//!
//! let thresholds = Thresholds::default();
//! assert!(is_meaningful(Some("a\nb\nc\n"), Some("a\nb\nc\nd\n"), &thresholds));
//! assert!(!is_meaningful(Some("hello world"), Some("hello  world"), &thresholds));
//! ```

mod measure;
mod significance;

pub use measure::{changed_chars, changed_lines, diff_stats, line_diff, similarity, DiffStats};
pub use significance::{evaluate, is_meaningful, Thresholds, Verdict};
