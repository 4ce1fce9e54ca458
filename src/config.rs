//! Editor configuration
//!
//! Loaded from an optional JSON file. Every field has a default, so `{}` is a
//! valid configuration. File names, the backup suffix, and tag names are part
//! of the on-disk contract and are deliberately not configurable.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{EditorError, EditorResult};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};

/// How the new file content replaces the old
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStrategy {
    /// Write a sibling temp file, fsync, rename over the target
    #[default]
    AtomicRename,
    /// Truncate and rewrite the target in place
    InPlace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditorConfig {
    #[serde(default)]
    pub replace_strategy: ReplaceStrategy,

    /// fsync backups, temp files and targets (default true)
    #[serde(default = "default_true")]
    pub fsync: bool,

    /// Re-read and decode the target after replacing it (default true)
    #[serde(default = "default_true")]
    pub verify_after_write: bool,

    /// Namespace given to item and attribute ids written without one
    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    /// Lowest log severity written to stderr
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    "minecraft".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            replace_strategy: ReplaceStrategy::default(),
            fsync: true,
            verify_after_write: true,
            default_namespace: default_namespace(),
            log_level: default_log_level(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> EditorResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| EditorError::io("read config", path, e))?;

        let config: EditorConfig = serde_json::from_str(&content).map_err(|e| {
            EditorError::invalid_input(format!("invalid config {}: {}", path.display(), e))
        })?;

        config.validate()?;
        log_event_with_fields(Event::ConfigLoaded, &[("path", &path.display().to_string())]);
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> EditorResult<Self> {
        match fs::metadata(path) {
            Ok(_) => Self::load(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(EditorError::io("read config", path, e)),
        }
    }

    fn validate(&self) -> EditorResult<()> {
        let ns = &self.default_namespace;
        let valid_ns = !ns.is_empty()
            && ns
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_-.".contains(c));
        if !valid_ns {
            return Err(EditorError::invalid_value(
                "default_namespace",
                format!("'{}' is not a valid namespace", ns),
            ));
        }

        self.log_severity()?;
        Ok(())
    }

    pub fn log_severity(&self) -> EditorResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| EditorError::invalid_value("log_level", e))
    }

    /// Applies the logging settings process-wide
    pub fn apply_logging(&self) -> EditorResult<()> {
        Logger::set_min_severity(self.log_severity()?);
        Ok(())
    }
}
