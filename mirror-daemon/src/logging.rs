//! Log sink: timestamped lines appended to the configured log file, and
//! optionally echoed to stdout.
//!
//! `log` records emitted by `mirror-sync` are bridged into the same
//! subscriber, so per-entry outcomes land in the file too.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{io_err, DaemonError};

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
///
/// Calling this twice is harmless; the second subscriber is ignored.
pub fn init_tracing(log_file: &Path, console: bool) -> Result<(), DaemonError> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| io_err(log_file, e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    let console_layer = console.then(|| fmt::layer().with_target(false));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();
    Ok(())
}
