//! Root initialisation: make sure both roots exist as directories.
//!
//! Safe to call before every pass; when both roots already exist it only
//! reads metadata.

use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;

use mirror_core::RootPair;

use crate::SyncError;

/// Which branch [`ensure_roots`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootsStatus {
    CreatedBoth,
    AlreadyExist,
    CreatedReplica,
    CreatedSource,
}

impl RootsStatus {
    pub fn message(self) -> &'static str {
        match self {
            RootsStatus::CreatedBoth => "Source and Replica folders had been created.",
            RootsStatus::AlreadyExist => "Source and Replica folders already exist.",
            RootsStatus::CreatedReplica => {
                "Replica folder not found, a new one has been created."
            }
            RootsStatus::CreatedSource => "Source folder not found, a new one has been created.",
        }
    }
}

/// Create whichever of the two roots is missing.
pub fn ensure_roots(roots: &RootPair) -> Result<RootsStatus, SyncError> {
    let source_exists = root_exists(&roots.source)?;
    let replica_exists = root_exists(&roots.replica)?;

    let status = match (source_exists, replica_exists) {
        (true, true) => RootsStatus::AlreadyExist,
        (false, false) => {
            create_root(&roots.source)?;
            create_root(&roots.replica)?;
            RootsStatus::CreatedBoth
        }
        (true, false) => {
            create_root(&roots.replica)?;
            RootsStatus::CreatedReplica
        }
        (false, true) => {
            create_root(&roots.source)?;
            RootsStatus::CreatedSource
        }
    };

    tracing::info!("{}", status.message());
    Ok(status)
}

/// `Ok(true)` for an existing directory, `Ok(false)` when nothing is there.
pub(crate) fn root_exists(path: &Path) -> Result<bool, SyncError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(true),
        Ok(_) => Err(SyncError::RootNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(SyncError::RootInit {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn create_root(path: &Path) -> Result<(), SyncError> {
    std::fs::create_dir_all(path).map_err(|source| SyncError::RootInit {
        path: path.to_path_buf(),
        source,
    })
}
