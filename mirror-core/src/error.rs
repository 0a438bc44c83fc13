//! Error types for mirror-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating a [`crate::MirrorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading or writing a config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the given path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// A required field was supplied neither on the command line nor in a file.
    #[error("missing {field}: pass it as an argument or set it in the config file")]
    Missing { field: &'static str },

    /// The pass interval must be at least one second.
    #[error("invalid interval {secs}s; must be at least 1 second")]
    InvalidInterval { secs: u64 },

    /// Source and replica are the same directory or one contains the other.
    #[error("source {source_root} and replica {replica_root} overlap")]
    OverlappingRoots {
        source_root: PathBuf,
        replica_root: PathBuf,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
