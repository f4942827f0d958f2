//! Path utilities.
//!
//! Layout of the per-project directory:
//! ```text
//! <root>/.auto-snap/
//!   config.json        # Tracking policy
//!   watcher.log        # Watch process log
//!   store/
//!     <relative path>.snap
//! ```

use std::path::{Component, Path, PathBuf};

/// Name of the project-local autosnap directory.
pub const PROJECT_DIR: &str = ".auto-snap";

/// Name of the config file inside the project directory.
pub const CONFIG_FILE: &str = "config.json";

/// Name of the version store directory inside the project directory.
pub const STORE_DIR: &str = "store";

/// Extension appended to each tracked file's artifact.
pub const ARTIFACT_EXTENSION: &str = "snap";

/// Get the project-local autosnap directory.
pub fn project_dir(root: &Path) -> PathBuf {
    root.join(PROJECT_DIR)
}

/// Get the path of the project config file.
pub fn config_path(root: &Path) -> PathBuf {
    project_dir(root).join(CONFIG_FILE)
}

/// Get the version store directory.
pub fn store_dir(root: &Path) -> PathBuf {
    project_dir(root).join(STORE_DIR)
}

/// Get the watch process log file.
pub fn watch_log_path(root: &Path) -> PathBuf {
    project_dir(root).join("watcher.log")
}

/// Normalize a path by removing `.` and `..` components.
///
/// Unlike `canonicalize`, this doesn't require the path to exist.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            _ => {
                result.push(component);
            }
        }
    }

    result
}

/// Make a path relative to a base directory.
///
/// Relative inputs are taken as already relative to `base`. Returns `None`
/// if the path is not within the base directory or escapes it via `..`.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let relative = if path.is_absolute() {
        normalize(path)
            .strip_prefix(normalize(base))
            .ok()?
            .to_path_buf()
    } else {
        path.to_path_buf()
    };

    let mut result = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if result.as_os_str().is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Split a relative path into its string components.
///
/// Returns `None` for non-UTF-8 components.
pub fn components(relative: &Path) -> Option<Vec<String>> {
    relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str().map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Check whether any component of a relative path is hidden (dot-prefixed).
pub fn is_hidden(relative: &Path) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let root = Path::new("/home/user/project");
        assert_eq!(
            config_path(root),
            PathBuf::from("/home/user/project/.auto-snap/config.json")
        );
        assert_eq!(
            store_dir(root),
            PathBuf::from("/home/user/project/.auto-snap/store")
        );
    }

    #[test]
    fn test_normalize() {
        let path = Path::new("/home/user/./project/../project/src");
        assert_eq!(normalize(path), PathBuf::from("/home/user/project/src"));
    }

    #[test]
    fn test_relative_to() {
        let base = Path::new("/home/user/project");
        assert_eq!(
            relative_to(Path::new("/home/user/project/src/main.rs"), base),
            Some(PathBuf::from("src/main.rs"))
        );
        assert_eq!(
            relative_to(Path::new("src/./main.rs"), base),
            Some(PathBuf::from("src/main.rs"))
        );
        assert_eq!(relative_to(Path::new("/etc/passwd"), base), None);
        assert_eq!(relative_to(Path::new("../escape.txt"), base), None);
        assert_eq!(relative_to(base, base), None);
    }

    #[test]
    fn test_components() {
        assert_eq!(
            components(Path::new("src/lib/mod.rs")),
            Some(vec!["src".to_string(), "lib".to_string(), "mod.rs".to_string()])
        );
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new(".git/config")));
        assert!(is_hidden(Path::new("src/.env")));
        assert!(!is_hidden(Path::new("src/main.rs")));
    }
}
