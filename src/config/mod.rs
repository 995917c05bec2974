//! Configuration file handling
//!
//! The configuration is a single JSON object:
//!
//! ```json
//! {
//!   "input": {
//!     "ways": "ways.jsonl",
//!     "way_tags": "way_tags.jsonl",
//!     "way_nodes": "way_nodes.jsonl",
//!     "read_all_users": false
//!   },
//!   "spill": { "enabled": true, "directory": "/var/tmp", "max_bytes": 1073741824, "compress": true },
//!   "log_level": "info"
//! }
//! ```
//!
//! Relative input paths are resolved against the directory holding the
//! configuration file.

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::Severity;
use crate::spill::SpillOptions;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The three sorted input tables (required)
    pub input: InputConfig,

    /// Spill storage (optional, enabled by default)
    #[serde(default)]
    pub spill: SpillConfig,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Locations of the way, way-tag and way-node tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Way rows sorted by (id, version)
    pub ways: PathBuf,
    /// Way tag rows sorted by (way_id, version)
    pub way_tags: PathBuf,
    /// Way node rows sorted by (way_id, version)
    pub way_nodes: PathBuf,
    /// Include ways by contributors who have not made their edits public
    #[serde(default)]
    pub read_all_users: bool,
}

/// Spill storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpillConfig {
    /// Route every input stream through a spill file (default: true)
    #[serde(default = "default_spill_enabled")]
    pub enabled: bool,
    /// Directory for spill files; the OS temp dir when absent
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Upper bound on each spill file in uncompressed frame bytes
    #[serde(default)]
    pub max_bytes: Option<u64>,
    /// Gzip spill files (default: true)
    #[serde(default = "default_spill_compress")]
    pub compress: bool,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            enabled: default_spill_enabled(),
            directory: None,
            max_bytes: None,
            compress: default_spill_compress(),
        }
    }
}

impl SpillConfig {
    /// Spill options for the stream identified by `prefix`.
    pub fn options(&self, prefix: &str) -> SpillOptions {
        SpillOptions {
            directory: self.directory.clone(),
            prefix: prefix.to_string(),
            max_bytes: self.max_bytes,
            compress: self.compress,
        }
    }
}

fn default_spill_enabled() -> bool {
    true
}
fn default_spill_compress() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_json(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a JSON string without validating it
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.input.ways,
            &mut self.input.way_tags,
            &mut self.input.way_nodes,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(ref mut dir) = self.spill.directory {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, path) in [
            ("input.ways", &self.input.ways),
            ("input.way_tags", &self.input.way_tags),
            ("input.way_nodes", &self.input.way_nodes),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }

        if self.spill.max_bytes == Some(0) {
            return Err(ConfigError::Invalid(
                "spill.max_bytes must be > 0".to_string(),
            ));
        }

        if let Some(ref dir) = self.spill.directory {
            if !dir.is_dir() {
                return Err(ConfigError::Invalid(format!(
                    "spill.directory is not a directory: {}",
                    dir.display()
                )));
            }
        }

        self.log_severity()?;

        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(ConfigError::Invalid)
    }
}
