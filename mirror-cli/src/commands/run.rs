//! `mirror run`: periodic mirroring until Ctrl-C.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mirror_core::config::ConfigLayer;

use super::RootArgs;

/// Arguments for `mirror run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub roots: RootArgs,

    /// Seconds between passes [default: 10].
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// File the pass log is appended to [default: sync_log_file.txt].
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = self.roots.resolve(ConfigLayer {
            interval_secs: self.interval,
            log_file: self.log,
            ..ConfigLayer::default()
        })?;

        println!(
            "Mirroring {} → {} every {}s (log: {})",
            config.source.display(),
            config.replica.display(),
            config.interval_secs,
            config.log_file.display(),
        );

        let stats = mirror_daemon::start_blocking(&config).context("mirror exited with error")?;
        println!(
            "Stopped after {} passes ({} failed)",
            stats.passes, stats.failed_passes
        );
        Ok(())
    }
}
