//! Tracking policy configuration.
//!
//! The policy lives in `<root>/.auto-snap/config.json`. Keys missing from the
//! file take their default values, so a partial file such as
//! `{ "debounce": 2000 }` is valid.

use crate::error::{ConfigError, CoreResult};
use crate::filter::FileFilter;
use autosnap_diff::Thresholds;
use autosnap_snapshot::StoreConfig;
use autosnap_util::path;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// What to track and when a change is worth recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackingPolicy {
    /// Quiescence window in milliseconds before an edit is processed.
    pub debounce: u64,

    /// Minimum changed characters for a change not to be trivial.
    pub min_char_change: usize,

    /// Minimum changed lines for a change not to be trivial.
    pub min_line_change: usize,

    /// Line similarity (0 to 1) at or above which a change is dropped.
    pub similarity_threshold: f64,

    /// Drop changes that only touch whitespace.
    pub ignore_whitespace: bool,

    /// Glob patterns of files to track, relative to the root.
    pub include: Vec<String>,

    /// Glob patterns of files never to track.
    pub exclude: Vec<String>,

    /// Files larger than this are never versioned.
    #[serde(rename = "maxFileSizeMB")]
    pub max_file_size_mb: f64,

    /// Declared retention policy. Not enforced.
    pub retention: RetentionPolicy,
}

/// Retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetentionPolicy {
    /// Days to keep versions.
    pub days: u32,
    /// Maximum versions to keep per file.
    pub max_snapshots: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            days: 7,
            max_snapshots: 200,
        }
    }
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            debounce: 10_000,
            min_char_change: thresholds.min_char_change,
            min_line_change: thresholds.min_line_change,
            similarity_threshold: thresholds.similarity_threshold,
            ignore_whitespace: thresholds.ignore_whitespace,
            include: vec!["**/*".to_string()],
            exclude: [
                "node_modules/**",
                ".git/**",
                "dist/**",
                "build/**",
                ".auto-snap/**",
                "package-lock.json",
                ".gitignore",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_file_size_mb: 2.0,
            retention: RetentionPolicy::default(),
        }
    }
}

impl TrackingPolicy {
    /// Load the policy of a project.
    ///
    /// Falls back to the defaults when the project has no config file.
    pub async fn load(root: &Path) -> CoreResult<Self> {
        let config_path = path::config_path(root);
        if !tokio::fs::try_exists(&config_path).await? {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_file(&config_path).await
    }

    /// Load and validate a policy file.
    pub async fn load_file(file: &Path) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(file).await?;
        Self::parse(&content, &file.display().to_string())
    }

    /// Parse and validate policy JSON.
    pub fn parse(content: &str, source: &str) -> CoreResult<Self> {
        let policy: Self = serde_json::from_str(content).map_err(|e| ConfigError::InvalidJson {
            path: source.to_string(),
            message: e.to_string(),
        })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Create the project directory, store directory and default config.
    ///
    /// Returns `true` if the config file was created, `false` if it already existed.
    pub async fn init(root: &Path) -> CoreResult<bool> {
        tokio::fs::create_dir_all(path::store_dir(root)).await?;

        let config_path = path::config_path(root);
        if tokio::fs::try_exists(&config_path).await? {
            return Ok(false);
        }

        tokio::fs::write(&config_path, Self::default().to_json_pretty()?).await?;
        info!("Saved configuration to {}", config_path.display());
        Ok(true)
    }

    /// Check value ranges and glob patterns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::validation(format!(
                "similarityThreshold must be between 0 and 1, got {}",
                self.similarity_threshold
            )));
        }
        if !self.max_file_size_mb.is_finite() || self.max_file_size_mb < 0.0 {
            return Err(ConfigError::validation(format!(
                "maxFileSizeMB must be a non-negative number, got {}",
                self.max_file_size_mb
            )));
        }
        FileFilter::new(&self.include, &self.exclude)?;
        Ok(())
    }

    /// Significance thresholds.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_char_change: self.min_char_change,
            min_line_change: self.min_line_change,
            similarity_threshold: self.similarity_threshold,
            ignore_whitespace: self.ignore_whitespace,
        }
    }

    /// Quiescence window.
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce)
    }

    /// Size ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        (self.max_file_size_mb * BYTES_PER_MB) as u64
    }

    /// Whether a file of `size` bytes is over the ceiling.
    pub fn exceeds_size_limit(&self, size: u64) -> bool {
        size > self.max_file_size_bytes()
    }

    /// Version store settings derived from the policy.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_file_size: Some(self.max_file_size_bytes()),
        }
    }

    /// Serialize as indented JSON.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
