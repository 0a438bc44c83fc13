//! Periodic driver: runs a mirror pass every N seconds until shut down.
//!
//! The driver owns the only control-flow loop; the pass itself lives in
//! `mirror-sync` and knows nothing about timing.

pub mod driver;
mod error;
pub mod log_rotation;
pub mod logging;

pub use driver::{run, run_periodic, start_blocking, DriverStats};
pub use error::DaemonError;
pub use logging::init_tracing;
