use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the periodic driver and its log sink.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] mirror_core::ConfigError),

    #[error("sync error: {0}")]
    Sync(#[from] mirror_sync::SyncError),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl DaemonError {
    /// The roots could not be initialised before the first pass.
    pub fn is_root_init(&self) -> bool {
        matches!(self, DaemonError::Sync(err) if err.is_fatal())
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
