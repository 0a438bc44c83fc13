//! Mirror: one-way periodic directory mirroring.
//!
//! # Usage
//!
//! ```text
//! mirror run    <source> <replica> [--interval 10] [--log sync_log_file.txt] [--config FILE]
//! mirror sync   <source> <replica> [--dry-run] [--json] [--log FILE] [--config FILE]
//! mirror status <source> <replica> [--json] [--config FILE]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{run::RunArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "mirror",
    version,
    about = "Keep a replica directory in sync with a source directory",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mirror source into replica every interval until interrupted.
    Run(RunArgs),

    /// Run a single mirror pass and report what changed.
    Sync(SyncArgs),

    /// Show what the next pass would do, without touching anything.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
