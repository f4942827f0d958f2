//! Significance gates.

use crate::measure::{changed_chars, changed_lines, similarity};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Policy thresholds for the significance gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum changed characters for a change not to be trivial.
    pub min_char_change: usize,
    /// Minimum changed lines for a change not to be trivial.
    pub min_line_change: usize,
    /// Line similarity at or above which a change is dropped.
    pub similarity_threshold: f64,
    /// Drop changes that only touch whitespace.
    pub ignore_whitespace: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_char_change: 5,
            min_line_change: 1,
            similarity_threshold: 0.98,
            ignore_whitespace: true,
        }
    }
}

/// Outcome of evaluating a change against the gates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// No previous content: the file is new.
    NewFile,
    /// No new content: the file was deleted.
    Deleted,
    /// Too few lines and characters changed.
    Trivial,
    /// Contents differ only in whitespace.
    WhitespaceOnly,
    /// Line similarity reached the threshold.
    TooSimilar(f64),
    /// Passed every gate.
    Meaningful,
}

impl Verdict {
    /// Whether the change should be recorded.
    pub fn is_meaningful(&self) -> bool {
        matches!(self, Verdict::NewFile | Verdict::Deleted | Verdict::Meaningful)
    }
}

/// Evaluate a change, stopping at the first gate that suppresses it.
pub fn evaluate(old: Option<&str>, new: Option<&str>, thresholds: &Thresholds) -> Verdict {
    let (old, new) = match (old, new) {
        (None, _) => return Verdict::NewFile,
        (_, None) => return Verdict::Deleted,
        (Some(old), Some(new)) => (old, new),
    };

    if is_trivial(old, new, thresholds) {
        debug!("Trivial change skipped");
        return Verdict::Trivial;
    }

    if thresholds.ignore_whitespace && strip_whitespace_eq(old, new) {
        debug!("Whitespace-only change skipped");
        return Verdict::WhitespaceOnly;
    }

    let value = similarity(old, new);
    if value >= thresholds.similarity_threshold {
        debug!(similarity = value, "Content too similar, skipped");
        return Verdict::TooSimilar(value);
    }

    Verdict::Meaningful
}

/// Whether a change should be recorded under the given thresholds.
pub fn is_meaningful(old: Option<&str>, new: Option<&str>, thresholds: &Thresholds) -> bool {
    evaluate(old, new, thresholds).is_meaningful()
}

/// A change is trivial only when it misses both the line and the character threshold.
fn is_trivial(old: &str, new: &str, thresholds: &Thresholds) -> bool {
    if changed_lines(old, new) >= thresholds.min_line_change {
        return false;
    }
    changed_chars(old, new) < thresholds.min_char_change
}

fn strip_whitespace_eq(old: &str, new: &str) -> bool {
    old.chars()
        .filter(|c| !c.is_whitespace())
        .eq(new.chars().filter(|c| !c.is_whitespace()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(count: usize) -> String {
        (0..count).map(|i| format!("line number {i}\n")).collect()
    }

    #[test]
    fn test_new_and_deleted_files_are_meaningful() {
        let t = Thresholds::default();
        assert_eq!(evaluate(None, Some("x"), &t), Verdict::NewFile);
        assert_eq!(evaluate(Some("x"), None, &t), Verdict::Deleted);
        assert_eq!(evaluate(None, None, &t), Verdict::NewFile);
        assert!(is_meaningful(None, Some(""), &t));
    }

    #[test]
    fn test_added_line_is_meaningful() {
        let t = Thresholds::default();
        assert_eq!(
            evaluate(Some("a\nb\nc\n"), Some("a\nb\nc\nd\n"), &t),
            Verdict::Meaningful
        );
    }

    #[test]
    fn test_extra_space_is_whitespace_only() {
        let t = Thresholds::default();
        assert_eq!(
            evaluate(Some("hello world"), Some("hello  world"), &t),
            Verdict::WhitespaceOnly
        );
    }

    #[test]
    fn test_extra_space_counts_when_whitespace_matters() {
        let t = Thresholds {
            ignore_whitespace: false,
            ..Thresholds::default()
        };
        assert!(is_meaningful(Some("hello world"), Some("hello  world"), &t));
    }

    #[test]
    fn test_similar_content_is_dropped_even_without_whitespace_gate() {
        let t = Thresholds {
            ignore_whitespace: false,
            ..Thresholds::default()
        };
        let old = lines(100);
        let new = old.replacen("line number 50\n", "line  number 50\n", 1);
        match evaluate(Some(&old), Some(&new), &t) {
            Verdict::TooSimilar(value) => assert!(value >= 0.98),
            other => panic!("expected TooSimilar, got {other:?}"),
        }
    }

    #[test]
    fn test_trivial_gate_requires_both_thresholds_to_fail() {
        let t = Thresholds {
            min_line_change: 3,
            min_char_change: 5,
            ignore_whitespace: false,
            similarity_threshold: 1.1,
        };
        // Two changed lines, one changed char: below both thresholds.
        assert_eq!(evaluate(Some("abc\n"), Some("abd\n"), &t), Verdict::Trivial);
        // Two changed lines but many changed chars: crosses the char threshold.
        assert_eq!(
            evaluate(Some("abc\n"), Some("a completely different line\n"), &t),
            Verdict::Meaningful
        );
    }

    #[test]
    fn test_identical_content_is_not_meaningful() {
        let t = Thresholds::default();
        assert!(!is_meaningful(Some("v1"), Some("v1"), &t));
    }

    #[test]
    fn test_rewrite_is_meaningful() {
        let t = Thresholds::default();
        assert!(is_meaningful(
            Some("v1"),
            Some("v1 plus enough change"),
            &t
        ));
    }

    #[test]
    fn test_full_rewrite_of_large_file_is_evaluated_promptly() {
        let old: String = (0..40_000)
            .map(|i| format!("row {i:06},first,draft,value\n"))
            .collect();
        let new: String = (0..40_000)
            .map(|i| format!("line {i:06};second;pass;total\n"))
            .collect();

        let started = std::time::Instant::now();
        let verdict = evaluate(Some(&old), Some(&new), &Thresholds::default());
        assert!(
            started.elapsed() < std::time::Duration::from_secs(30),
            "evaluation took {:?}",
            started.elapsed()
        );
        assert_eq!(verdict, Verdict::Meaningful);
    }
}
