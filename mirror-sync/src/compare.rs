//! Directory comparator.
//!
//! Classification rules, applied to names directly under each root only:
//!
//! 1. Source name absent from replica → `Create`
//! 2. Kinds differ (file vs folder) → `Update` (the replica entry is replaced)
//! 3. Source mtime strictly newer than replica mtime → `Update`
//! 4. Otherwise (including equal mtimes) → `UpToDate`
//! 5. Replica name absent from source → `Delete`
//!
//! Folders are never diffed below the top level: a folder whose own mtime has
//! not moved forward is `UpToDate` even if something deep inside it changed.
//!
//! This module only reads metadata.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;

use mirror_core::{Classification, Entry, EntryKind, RootPair};

use crate::SyncError;

/// One classified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub name: OsString,
    /// Source kind for `Create`/`Update`/`UpToDate`, replica kind for `Delete`.
    pub kind: EntryKind,
    /// Kind currently in the replica, if any.
    pub replica_kind: Option<EntryKind>,
    pub classification: Classification,
}

impl PlannedEntry {
    /// The replica entry has to be removed before copying.
    pub fn replaces_kind(&self) -> bool {
        matches!(self.replica_kind, Some(kind) if kind != self.kind)
    }
}

/// An entry skipped for this pass because its metadata could not be read.
#[derive(Debug)]
pub struct ReadFailure {
    pub name: OsString,
    pub error: SyncError,
}

/// Names found directly under the source root. Reporting only, so names that
/// are not UTF-8 appear lossily converted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub files: Vec<String>,
    pub folders: Vec<String>,
}

/// Full result of comparing the two roots.
#[derive(Debug, Default)]
pub struct Comparison {
    /// Sorted by name.
    pub entries: Vec<PlannedEntry>,
    pub unreadable: Vec<ReadFailure>,
    pub summary: SourceSummary,
}

impl Comparison {
    pub fn count(&self, classification: Classification) -> usize {
        self.entries
            .iter()
            .filter(|e| e.classification == classification)
            .count()
    }

    /// Entries the converger has to act on.
    pub fn pending(&self) -> impl Iterator<Item = &PlannedEntry> {
        self.entries
            .iter()
            .filter(|e| e.classification.is_mutation())
    }
}

/// Entries directly under one root.
#[derive(Debug, Default)]
pub struct Listing {
    pub entries: BTreeMap<OsString, Entry>,
    pub unreadable: Vec<ReadFailure>,
    /// Every name seen, including unreadable ones.
    pub names: BTreeSet<OsString>,
}

/// Compare both roots. Fails only when a root itself cannot be listed.
pub fn compare(roots: &RootPair) -> Result<Comparison, SyncError> {
    let source = list_entries(&roots.source)?;
    let replica = list_entries(&roots.replica)?;
    Ok(classify(source, replica))
}

/// Like [`compare`], but a root that does not exist yet lists as empty.
pub fn compare_existing(roots: &RootPair) -> Result<Comparison, SyncError> {
    let source = list_entries_or_empty(&roots.source)?;
    let replica = list_entries_or_empty(&roots.replica)?;
    Ok(classify(source, replica))
}

/// Read every entry directly under `root`.
///
/// Per-entry metadata failures are collected in [`Listing::unreadable`];
/// failure to open or iterate the directory itself is returned as
/// [`SyncError::ListRoot`], since a partial listing would make orphan
/// detection unsafe.
pub fn list_entries(root: &Path) -> Result<Listing, SyncError> {
    let list_err = |source| SyncError::ListRoot {
        path: root.to_path_buf(),
        source,
    };

    let mut listing = Listing::default();
    for dirent in std::fs::read_dir(root).map_err(list_err)? {
        let dirent = dirent.map_err(list_err)?;
        let path = dirent.path();
        let name = dirent.file_name();
        listing.names.insert(name.clone());

        match read_entry(&path, name.clone()) {
            Ok(entry) => {
                listing.entries.insert(name, entry);
            }
            Err(error) => listing.unreadable.push(ReadFailure { name, error }),
        }
    }
    Ok(listing)
}

/// Only a root that is definitely absent lists as empty; any other stat
/// failure surfaces through [`list_entries`] as `ListRoot`.
fn list_entries_or_empty(root: &Path) -> Result<Listing, SyncError> {
    match std::fs::metadata(root) {
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Listing::default()),
        _ => list_entries(root),
    }
}

/// Stat one entry, following symlinks.
pub(crate) fn read_entry(path: &Path, name: OsString) -> Result<Entry, SyncError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound && is_symlink(path) => {
            return Err(SyncError::UnsupportedEntry {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(SyncError::EntryRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let kind = if meta.is_file() {
        EntryKind::File
    } else if meta.is_dir() {
        EntryKind::Directory
    } else {
        return Err(SyncError::UnsupportedEntry {
            path: path.to_path_buf(),
        });
    };

    let modified = meta.modified().map_err(|source| SyncError::EntryRead {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Entry {
        name,
        kind,
        modified,
    })
}

fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Pure classification over two listings.
pub fn classify(source: Listing, replica: Listing) -> Comparison {
    let mut entries = Vec::new();
    let mut summary = SourceSummary::default();

    for (name, src) in &source.entries {
        let shown = name.to_string_lossy().into_owned();
        match src.kind {
            EntryKind::File => summary.files.push(shown),
            EntryKind::Directory => summary.folders.push(shown),
        }

        let classification = match replica.entries.get(name) {
            // Present but unreadable in the replica: already reported, skip.
            None if replica.names.contains(name) => continue,
            None => Classification::Create,
            Some(rep) if rep.kind != src.kind => Classification::Update,
            Some(rep) if src.modified > rep.modified => Classification::Update,
            Some(_) => Classification::UpToDate,
        };

        entries.push(PlannedEntry {
            name: name.clone(),
            kind: src.kind,
            replica_kind: replica.entries.get(name).map(|rep| rep.kind),
            classification,
        });
    }

    for (name, rep) in &replica.entries {
        // `names` includes unreadable source entries: never delete on a read error.
        if source.names.contains(name) {
            continue;
        }
        entries.push(PlannedEntry {
            name: name.clone(),
            kind: rep.kind,
            replica_kind: Some(rep.kind),
            classification: Classification::Delete,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut unreadable = source.unreadable;
    unreadable.extend(replica.unreadable);
    for failure in &unreadable {
        tracing::warn!("skipping {}: {}", failure.name.to_string_lossy(), failure.error);
    }

    Comparison {
        entries,
        unreadable,
        summary,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
