//! Line and character level diff measurements.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use std::time::Duration;

/// Upper bounds on the time spent computing a diff.
///
/// When exceeded, `similar` falls back to a coarser but still valid diff:
/// changed counts may overestimate and similarity may underestimate.
const LINE_DIFF_TIMEOUT: Duration = Duration::from_secs(1);
const CHAR_DIFF_TIMEOUT: Duration = Duration::from_millis(500);

/// Line-level summary of a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    /// Lines present only in the new content.
    pub added: usize,
    /// Lines present only in the old content.
    pub removed: usize,
}

impl DiffStats {
    /// Total changed lines.
    pub fn total(&self) -> usize {
        self.added + self.removed
    }
}

/// Line-level diff with a deadline.
///
/// Applying the resulting changes to `old` always yields `new` exactly.
pub fn line_diff<'a>(old: &'a str, new: &'a str) -> TextDiff<'a, 'a, 'a, str> {
    TextDiff::configure()
        .timeout(LINE_DIFF_TIMEOUT)
        .diff_lines(old, new)
}

/// Count added and removed lines between two contents.
pub fn diff_stats(old: &str, new: &str) -> DiffStats {
    let diff = line_diff(old, new);
    let mut stats = DiffStats::default();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => stats.added += 1,
            ChangeTag::Delete => stats.removed += 1,
            ChangeTag::Equal => {}
        }
    }
    stats
}

/// Number of lines added or removed by a line-level diff.
pub fn changed_lines(old: &str, new: &str) -> usize {
    diff_stats(old, new).total()
}

/// Number of characters added or removed by a character-level diff.
pub fn changed_chars(old: &str, new: &str) -> usize {
    let diff = TextDiff::configure()
        .timeout(CHAR_DIFF_TIMEOUT)
        .diff_chars(old, new);
    diff.iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .map(|change| change.value().chars().count())
        .sum()
}

/// Fraction of lines left unchanged, relative to the longer content.
///
/// Returns a value in `[0, 1]`; two empty contents are fully similar.
pub fn similarity(old: &str, new: &str) -> f64 {
    let diff = line_diff(old, new);
    let total = diff.old_slices().len().max(diff.new_slices().len());
    if total == 0 {
        return 1.0;
    }

    let unchanged = diff
        .iter_all_changes()
        .filter(|change| change.tag() == ChangeTag::Equal)
        .count();

    unchanged as f64 / total as f64
}
