//! Error types for mirror-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from a pass.
///
/// Only the root-level variants ([`SyncError::is_fatal`]) abort a pass; the
/// rest are recorded against a single entry and the pass carries on.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A missing root could not be created, or its metadata could not be read.
    #[error("cannot initialise root {path}: {source}")]
    RootInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A root path exists but is a file (or something else) rather than a directory.
    #[error("root {path} exists but is not a directory")]
    RootNotDirectory { path: PathBuf },

    /// Listing the entries directly under a root failed.
    #[error("cannot list root {path}: {source}")]
    ListRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stat of a single entry failed (permissions, concurrent deletion).
    #[error("cannot read entry {path}: {source}")]
    EntryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry is neither a file nor a directory after following symlinks.
    #[error("unsupported entry type at {path}")]
    UnsupportedEntry { path: PathBuf },

    /// Copying a file or subtree into the replica failed.
    #[error("copy {from} -> {to} failed: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing a file or subtree from the replica failed.
    #[error("delete {path} failed: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// `true` when no comparison or convergence can proceed for this pass.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::RootInit { .. } | SyncError::RootNotDirectory { .. } | SyncError::ListRoot { .. }
        )
    }
}

pub(crate) fn copy_err(
    from: impl Into<PathBuf>,
    to: impl Into<PathBuf>,
    source: std::io::Error,
) -> SyncError {
    SyncError::Copy {
        from: from.into(),
        to: to.into(),
        source,
    }
}

pub(crate) fn delete_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Delete {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn only_root_errors_are_fatal() {
        let io = || io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(SyncError::RootInit { path: "/r".into(), source: io() }.is_fatal());
        assert!(SyncError::RootNotDirectory { path: "/r".into() }.is_fatal());
        assert!(SyncError::ListRoot { path: "/r".into(), source: io() }.is_fatal());
        assert!(!SyncError::EntryRead { path: "/r/a".into(), source: io() }.is_fatal());
        assert!(!copy_err("/s/a", "/r/a", io()).is_fatal());
        assert!(!delete_err("/r/a", io()).is_fatal());
    }

    #[test]
    fn copy_error_names_both_paths_and_cause() {
        let err = copy_err(
            "/s/a.txt",
            "/r/a.txt",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/s/a.txt"));
        assert!(msg.contains("/r/a.txt"));
        assert!(msg.contains("disk full"));
    }
}
