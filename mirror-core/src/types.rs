//! Domain types shared by the comparator, converger and driver.
//!
//! Nothing here is persisted between passes; every value is recomputed from
//! the filesystem on each pass.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Root pair
// ---------------------------------------------------------------------------

/// The two directories a pass operates on. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RootPair {
    /// Read-only side of the mirror.
    pub source: PathBuf,
    /// Side that converges towards `source`.
    pub replica: PathBuf,
}

impl RootPair {
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
        }
    }

    /// `<source>/<name>`, computed without I/O.
    pub fn source_entry(&self, name: impl AsRef<Path>) -> PathBuf {
        self.source.join(name)
    }

    /// `<replica>/<name>`, computed without I/O.
    pub fn replica_entry(&self, name: impl AsRef<Path>) -> PathBuf {
        self.replica.join(name)
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Kind of a top-level entry, after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "folder"),
        }
    }
}

/// A name directly under a root, with the metadata the comparator needs.
///
/// Names are kept as the platform gives them; they need not be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: OsString,
    pub kind: EntryKind,
    pub modified: SystemTime,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Per-name decision produced by the comparator and consumed by the converger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Present in source, absent from replica.
    Create,
    /// Source is newer than replica, or the kinds differ.
    Update,
    /// Nothing to do.
    UpToDate,
    /// Present in replica only.
    Delete,
}

impl Classification {
    /// `true` for every classification that mutates the replica.
    pub fn is_mutation(self) -> bool {
        !matches!(self, Classification::UpToDate)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Create => write!(f, "create"),
            Classification::Update => write!(f, "update"),
            Classification::UpToDate => write!(f, "up-to-date"),
            Classification::Delete => write!(f, "delete"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
