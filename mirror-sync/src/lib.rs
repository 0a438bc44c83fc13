//! # mirror-sync
//!
//! One-way mirroring of a source directory into a replica directory.
//!
//! Call [`run_pass`] to initialise both roots, classify every top-level
//! entry, and converge the replica. Each call is independent; schedule it
//! from the outside (see `mirror-daemon`).

pub mod compare;
pub mod converge;
pub mod error;
pub mod pipeline;
pub mod roots;

pub use compare::{compare, Comparison, PlannedEntry, ReadFailure, SourceSummary};
pub use converge::{apply, EntryOutcome, EntryReport};
pub use error::SyncError;
pub use pipeline::{run_pass, PassReport, PassStats};
pub use roots::{ensure_roots, RootsStatus};
