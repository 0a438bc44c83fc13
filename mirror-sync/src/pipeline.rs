//! Run-one-pass entrypoint shared by the CLI and the periodic driver.
//!
//! A pass is: root initialisation → comparison → convergence → summary log.
//! It holds no state between invocations and must not run concurrently with
//! another pass against the same replica.

use std::ffi::OsStr;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use mirror_core::{Classification, RootPair};

use crate::compare::{self, ReadFailure, SourceSummary};
use crate::converge::{self, EntryOutcome, EntryReport};
use crate::roots::{self, RootsStatus};
use crate::SyncError;

/// Everything a single pass did.
#[derive(Debug)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    /// `None` in dry-run, where roots are never created.
    pub roots: Option<RootsStatus>,
    pub entries: Vec<EntryReport>,
    /// Entries skipped because their metadata could not be read.
    pub unreadable: Vec<ReadFailure>,
    pub summary: SourceSummary,
    pub duration: Duration,
    pub dry_run: bool,
}

/// Counters derived from a [`PassReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub created: usize,
    pub updated: usize,
    pub up_to_date: usize,
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u128,
}

impl PassReport {
    pub fn stats(&self) -> PassStats {
        let mut stats = PassStats {
            skipped: self.unreadable.len(),
            duration_ms: self.duration.as_millis(),
            ..PassStats::default()
        };
        for entry in &self.entries {
            if entry.is_failed() {
                stats.failed += 1;
                continue;
            }
            match entry.classification {
                Classification::Create => stats.created += 1,
                Classification::Update => stats.updated += 1,
                Classification::UpToDate => stats.up_to_date += 1,
                Classification::Delete => stats.deleted += 1,
            }
        }
        stats
    }

    /// Entries whose operation failed.
    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| e.is_failed())
    }

    /// No failed operation and no unreadable entry.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none() && self.unreadable.is_empty()
    }

    /// Look up the report line for `name`.
    pub fn entry(&self, name: impl AsRef<OsStr>) -> Option<&EntryReport> {
        let name = name.as_ref();
        self.entries.iter().find(|e| e.name.as_os_str() == name)
    }

    /// Classifications that (would) mutate the replica and did not fail.
    pub fn changes(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, EntryOutcome::Applied | EntryOutcome::WouldApply))
            .count()
    }
}

/// Run one full pass over `roots`.
///
/// Returns `Err` only for pass-fatal errors ([`SyncError::is_fatal`]);
/// per-entry failures are carried in the report.
pub fn run_pass(roots: &RootPair, dry_run: bool) -> Result<PassReport, SyncError> {
    let started_at = Utc::now();
    let started = Instant::now();

    let (roots_status, comparison) = if dry_run {
        for path in [&roots.source, &roots.replica] {
            roots::root_exists(path)?;
        }
        (None, compare::compare_existing(roots)?)
    } else {
        let status = roots::ensure_roots(roots)?;
        (Some(status), compare::compare(roots)?)
    };

    let entries = converge::apply(roots, &comparison.entries, dry_run);

    let summary = comparison.summary;
    tracing::info!(
        "Source folder contains: Files: {:?} Folders: {:?}",
        summary.files,
        summary.folders
    );

    Ok(PassReport {
        started_at,
        roots: roots_status,
        entries,
        unreadable: comparison.unreadable,
        summary,
        duration: started.elapsed(),
        dry_run,
    })
}
