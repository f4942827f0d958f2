//! Per-path quiescence tracking.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

/// Tracks, per path, when write activity will be considered settled.
///
/// Every event for a path pushes its deadline to `now + window`; a path is
/// due once its deadline passes without further events.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadlines: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    /// Create a debouncer with the given quiescence window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: HashMap::new(),
        }
    }

    /// Record activity on a path.
    pub fn touch(&mut self, path: PathBuf, now: Instant) {
        self.deadlines.insert(path, now + self.window);
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every path whose deadline has passed, sorted.
    pub fn drain_due(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut due: Vec<PathBuf> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &due {
            self.deadlines.remove(path);
        }
        due.sort();
        due
    }

    /// Number of paths awaiting quiescence.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Whether no path is pending.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(100);

    #[test]
    fn test_path_due_after_quiet_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.touch(PathBuf::from("a.txt"), start);

        assert_eq!(debouncer.next_deadline(), Some(start + WINDOW));
        assert!(debouncer.drain_due(start + Duration::from_millis(99)).is_empty());
        assert_eq!(
            debouncer.drain_due(start + WINDOW),
            vec![PathBuf::from("a.txt")]
        );
        assert!(debouncer.is_empty());
        assert_eq!(debouncer.next_deadline(), None);
    }

    #[test]
    fn test_new_activity_resets_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.touch(PathBuf::from("a.txt"), start);
        debouncer.touch(PathBuf::from("a.txt"), start + Duration::from_millis(80));

        assert_eq!(debouncer.len(), 1);
        assert!(debouncer.drain_due(start + WINDOW).is_empty());
        assert_eq!(debouncer.drain_due(start + Duration::from_millis(180)).len(), 1);
    }

    #[test]
    fn test_paths_are_independent() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.touch(PathBuf::from("b.txt"), start);
        debouncer.touch(PathBuf::from("a.txt"), start + Duration::from_millis(50));

        assert_eq!(
            debouncer.drain_due(start + WINDOW),
            vec![PathBuf::from("b.txt")]
        );
        assert_eq!(
            debouncer.next_deadline(),
            Some(start + Duration::from_millis(150))
        );
        assert_eq!(
            debouncer.drain_due(start + Duration::from_millis(150)),
            vec![PathBuf::from("a.txt")]
        );
    }
}
