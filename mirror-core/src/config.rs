//! Explicit mirror configuration.
//!
//! A [`MirrorConfig`] is built once at startup from (in increasing priority)
//! built-in defaults, an optional YAML file and command-line values, then
//! passed by reference into every pass. There is no process-wide config.
//!
//! ```yaml
//! source: /data/source
//! replica: /backup/replica
//! interval_secs: 10
//! log_file: sync_log_file.txt
//! ```

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::RootPair;

/// Seconds between two passes when nothing else is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Log file used when nothing else is configured, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "sync_log_file.txt";

/// Fully resolved, validated configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub interval_secs: u64,
    pub log_file: PathBuf,
}

impl MirrorConfig {
    /// Build a config with default interval and log file.
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }

    /// Load and validate a YAML config file. Every field except the roots is optional.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        ConfigLayer::load(path)?.build()
    }

    /// Write this config as YAML, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|e| io_err(path, e))
    }

    pub fn roots(&self) -> RootPair {
        RootPair::new(self.source.clone(), self.replica.clone())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Reject configurations no pass could run safely against.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval {
                secs: self.interval_secs,
            });
        }

        let source = resolve(&self.source);
        let replica = resolve(&self.replica);
        if source.starts_with(&replica) || replica.starts_with(&source) {
            return Err(ConfigError::OverlappingRoots {
                source_root: self.source.clone(),
                replica_root: self.replica.clone(),
            });
        }
        Ok(())
    }
}

/// One layer of partially specified configuration (a file or the command line).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl ConfigLayer {
    /// Parse a YAML layer from disk.
    ///
    /// Returns `ConfigError::NotFound` if absent and `ConfigError::Parse`
    /// (with path + line context) if malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Values set in `over` win; unset values fall through to `self`.
    pub fn merge(self, over: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            source: over.source.or(self.source),
            replica: over.replica.or(self.replica),
            interval_secs: over.interval_secs.or(self.interval_secs),
            log_file: over.log_file.or(self.log_file),
        }
    }

    /// Fill defaults and validate.
    pub fn build(self) -> Result<MirrorConfig, ConfigError> {
        let config = MirrorConfig {
            source: self.source.ok_or(ConfigError::Missing { field: "source" })?,
            replica: self.replica.ok_or(ConfigError::Missing { field: "replica" })?,
            interval_secs: self.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS),
            log_file: self
                .log_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Absolute, lexically normalised form of `path`, following symlinks when the path exists.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
