//! Mirror core library: domain types, configuration and errors.
//!
//! - [`types`]: root pair, entries and classifications
//! - [`config`]: [`MirrorConfig`], the value every pass receives
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{MirrorConfig, DEFAULT_INTERVAL_SECS, DEFAULT_LOG_FILE};
pub use error::ConfigError;
pub use types::{Classification, Entry, EntryKind, RootPair};
