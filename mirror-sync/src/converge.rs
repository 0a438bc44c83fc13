//! Converger: apply a [`Comparison`](crate::compare::Comparison) to the replica.
//!
//! ## Per classification
//!
//! - `Create`: copy the file, or the whole subtree for a folder.
//! - `Update`: files are staged in a uniquely named temp file next to the
//!   target and renamed over it;
//!   folders are removed and copied again from scratch. A kind mismatch
//!   removes the replica entry first whatever its kind.
//! - `UpToDate`: nothing.
//! - `Delete`: remove the file, or the whole subtree for a folder.
//!
//! Every entry is handled independently; a failure is recorded against that
//! entry and the remaining entries are still processed. Only paths under the
//! replica root are ever written.

use std::ffi::OsString;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use filetime::FileTime;

use mirror_core::{Classification, EntryKind, RootPair};

use crate::compare::PlannedEntry;
use crate::error::{copy_err, delete_err};
use crate::SyncError;

/// Outcome of converging a single entry.
#[derive(Debug)]
pub enum EntryOutcome {
    /// Classification was `UpToDate`; nothing was touched.
    Unchanged,
    /// The replica now reflects the source for this entry.
    Applied,
    /// Dry-run: the change *would* have been applied.
    WouldApply,
    /// The operation failed; the entry is retried on the next pass.
    Failed { error: SyncError },
}

/// Per-entry line of a pass report.
#[derive(Debug)]
pub struct EntryReport {
    pub name: OsString,
    pub kind: EntryKind,
    pub classification: Classification,
    pub outcome: EntryOutcome,
}

impl EntryReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&SyncError> {
        match &self.outcome {
            EntryOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Apply every planned entry. Never fails as a whole.
pub fn apply(roots: &RootPair, plan: &[PlannedEntry], dry_run: bool) -> Vec<EntryReport> {
    plan.iter()
        .map(|entry| EntryReport {
            name: entry.name.clone(),
            kind: entry.kind,
            classification: entry.classification,
            outcome: apply_entry(roots, entry, dry_run),
        })
        .collect()
}

fn apply_entry(roots: &RootPair, entry: &PlannedEntry, dry_run: bool) -> EntryOutcome {
    let name = entry.name.to_string_lossy();
    let kind = entry.kind;

    if entry.classification == Classification::UpToDate {
        tracing::info!("{name} is up-to-date in replica folder.");
        return EntryOutcome::Unchanged;
    }

    if dry_run {
        tracing::info!(
            "[dry-run] would {} {kind} {name} in replica folder.",
            entry.classification
        );
        return EntryOutcome::WouldApply;
    }

    let source = roots.source_entry(&entry.name);
    let replica = roots.replica_entry(&entry.name);

    let result = match entry.classification {
        Classification::Create => copy_entry(&source, &replica, kind),
        Classification::Update => {
            if entry.replaces_kind() || kind == EntryKind::Directory {
                remove_entry(&replica).and_then(|()| copy_entry(&source, &replica, kind))
            } else {
                copy_entry(&source, &replica, kind)
            }
        }
        Classification::Delete => remove_entry(&replica),
        Classification::UpToDate => Ok(()),
    };

    match result {
        Ok(()) => {
            match entry.classification {
                Classification::Create => tracing::info!("Copied {kind} {name} to replica folder."),
                Classification::Update => tracing::info!("Updated {kind} {name} in replica folder."),
                _ => tracing::info!("Deleted {kind} {name} from replica folder."),
            }
            EntryOutcome::Applied
        }
        Err(error) => {
            tracing::error!(
                "failed to {} {kind} {name}: {error}",
                entry.classification
            );
            EntryOutcome::Failed { error }
        }
    }
}

// ---------------------------------------------------------------------------
// Copy
// ---------------------------------------------------------------------------

/// Copy `from` to `to` according to `kind`.
///
/// A failed folder copy removes whatever part of the subtree was written, so
/// the next pass sees the name as missing and classifies it `Create` again.
pub(crate) fn copy_entry(from: &Path, to: &Path, kind: EntryKind) -> Result<(), SyncError> {
    match kind {
        EntryKind::File => copy_file(from, to),
        EntryKind::Directory => copy_tree(from, to).inspect_err(|_| {
            if let Err(err) = std::fs::remove_dir_all(to) {
                if err.kind() != ErrorKind::NotFound {
                    tracing::warn!("could not clean up partial copy {}: {err}", to.display());
                }
            }
        }),
    }
}

/// Replace `to` with a copy of `from`.
///
/// The copy is staged in a freshly created temp file beside `to` and renamed
/// over it. The staging file is created exclusively, so it never overwrites
/// another replica entry, and it is removed on drop if anything fails.
fn copy_file(from: &Path, to: &Path) -> Result<(), SyncError> {
    let err = |e| copy_err(from, to, e);
    let parent = to.parent().unwrap_or_else(|| Path::new("."));

    let mut reader = File::open(from).map_err(err)?;
    let meta = reader.metadata().map_err(err)?;

    let mut staged = tempfile::Builder::new()
        .prefix(".mirror-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(err)?;
    std::io::copy(&mut reader, staged.as_file_mut()).map_err(err)?;
    staged
        .as_file()
        .set_permissions(meta.permissions())
        .map_err(err)?;
    preserve_times(staged.path(), &meta).map_err(err)?;

    staged.persist(to).map_err(|e| err(e.error))?;
    Ok(())
}

/// Recursive copy, following symlinks. `to` must not exist.
fn copy_tree(from: &Path, to: &Path) -> Result<(), SyncError> {
    let meta = std::fs::metadata(from).map_err(|e| copy_err(from, to, e))?;
    std::fs::create_dir(to).map_err(|e| copy_err(from, to, e))?;

    for dirent in std::fs::read_dir(from).map_err(|e| copy_err(from, to, e))? {
        let dirent = dirent.map_err(|e| copy_err(from, to, e))?;
        let child_from = dirent.path();
        let child_to = to.join(dirent.file_name());
        let child_meta =
            std::fs::metadata(&child_from).map_err(|e| copy_err(&child_from, &child_to, e))?;

        if child_meta.is_dir() {
            copy_tree(&child_from, &child_to)?;
        } else if child_meta.is_file() {
            std::fs::copy(&child_from, &child_to)
                .map_err(|e| copy_err(&child_from, &child_to, e))?;
            preserve_times(&child_to, &child_meta)
                .map_err(|e| copy_err(&child_from, &child_to, e))?;
        } else {
            return Err(SyncError::UnsupportedEntry { path: child_from });
        }
    }

    // Folder mtime last: creating children bumps it.
    preserve_times(to, &meta).map_err(|e| copy_err(from, to, e))
}

fn preserve_times(path: &Path, meta: &std::fs::Metadata) -> std::io::Result<()> {
    let atime = FileTime::from_last_access_time(meta);
    let mtime = FileTime::from_last_modification_time(meta);
    filetime::set_file_times(path, atime, mtime)
}

// ---------------------------------------------------------------------------
// Remove
// ---------------------------------------------------------------------------

/// Remove whatever is at `path`. Symlinks are removed, never followed.
/// An already-missing path counts as success.
pub(crate) fn remove_entry(path: &Path) -> Result<(), SyncError> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(delete_err(path, err)),
    };

    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(delete_err(path, err)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
