//! Include/exclude file matching.

use crate::error::ConfigError;
use autosnap_util::path;
use glob::{MatchOptions, Pattern};
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Decides which paths under the root are tracked.
///
/// A path is tracked when it matches an include pattern, matches no exclude
/// pattern, and has no dot-prefixed component.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    /// Directories excluded wholesale by `<dir>/**` patterns.
    excluded_dirs: Vec<Pattern>,
}

impl FileFilter {
    /// Compile include and exclude patterns.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        let excluded_dirs = exclude
            .iter()
            .filter_map(|p| p.strip_suffix("/**"))
            .map(compile)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            include: include.iter().map(|p| compile(p)).collect::<Result<_, _>>()?,
            exclude: exclude.iter().map(|p| compile(p)).collect::<Result<_, _>>()?,
            excluded_dirs,
        })
    }

    /// Whether a file, relative to the root, is tracked.
    pub fn is_tracked(&self, relative: &Path) -> bool {
        if path::is_hidden(relative) {
            return false;
        }
        let Some(candidate) = as_slash_path(relative) else {
            return false;
        };

        self.include
            .iter()
            .any(|p| p.matches_with(&candidate, MATCH_OPTIONS))
            && !self
                .exclude
                .iter()
                .any(|p| p.matches_with(&candidate, MATCH_OPTIONS))
    }

    /// Whether a directory, relative to the root, can be skipped entirely.
    pub fn is_excluded_dir(&self, relative: &Path) -> bool {
        if path::is_hidden(relative) {
            return true;
        }
        let Some(candidate) = as_slash_path(relative) else {
            return true;
        };
        self.excluded_dirs
            .iter()
            .any(|p| p.matches_with(&candidate, MATCH_OPTIONS))
    }
}

fn compile(pattern: &str) -> Result<Pattern, ConfigError> {
    Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Join components with `/` so patterns behave the same on every platform.
fn as_slash_path(relative: &Path) -> Option<String> {
    path::components(relative).map(|parts| parts.join("/"))
}
