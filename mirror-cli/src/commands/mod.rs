//! Subcommand implementations.

pub mod run;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mirror_core::{config::ConfigLayer, MirrorConfig};

/// Root paths and optional config file, shared by every subcommand.
#[derive(Args, Debug)]
pub struct RootArgs {
    /// Directory to mirror from (never written).
    pub source: Option<PathBuf>,

    /// Directory to mirror into.
    pub replica: Option<PathBuf>,

    /// YAML config file; command-line values take precedence over it.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl RootArgs {
    /// Merge the config file (if any) with `overrides` and the positional roots.
    pub fn resolve(&self, overrides: ConfigLayer) -> Result<MirrorConfig> {
        let base = match &self.config {
            Some(path) => ConfigLayer::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ConfigLayer::default(),
        };
        let cli = ConfigLayer {
            source: self.source.clone(),
            replica: self.replica.clone(),
            ..overrides
        };
        base.merge(cli).build().context("invalid mirror configuration")
    }
}
