//! `mirror sync`: run exactly one pass and report it.

use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use mirror_core::{config::ConfigLayer, Classification};
use mirror_sync::{run_pass, EntryOutcome, PassReport, PassStats, SourceSummary};

use super::RootArgs;

/// Arguments for `mirror sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub roots: RootArgs,

    /// Show what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// File the pass log is appended to [default: sync_log_file.txt].
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.roots.resolve(ConfigLayer {
            log_file: self.log,
            ..ConfigLayer::default()
        })?;
        mirror_daemon::init_tracing(&config.log_file, false)
            .context("failed to open log file")?;

        let report = run_pass(&config.roots(), self.dry_run).with_context(|| {
            format!(
                "mirror pass failed for {} → {}",
                config.source.display(),
                config.replica.display()
            )
        })?;

        if self.json {
            print_json(&report)?;
        } else {
            print_report(&report);
        }

        let failed = report.stats().failed;
        if failed > 0 {
            bail!("{failed} entr{} could not be mirrored", if failed == 1 { "y" } else { "ies" });
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct PassReportJson<'a> {
    dry_run: bool,
    started_at: String,
    stats: PassStats,
    entries: Vec<EntryJson<'a>>,
    unreadable: Vec<UnreadableJson<'a>>,
    source: &'a SourceSummary,
}

#[derive(Serialize)]
struct EntryJson<'a> {
    name: Cow<'a, str>,
    kind: String,
    action: Classification,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct UnreadableJson<'a> {
    name: Cow<'a, str>,
    error: String,
}

fn print_json(report: &PassReport) -> Result<()> {
    let payload = PassReportJson {
        dry_run: report.dry_run,
        started_at: report.started_at.to_rfc3339(),
        stats: report.stats(),
        entries: report
            .entries
            .iter()
            .map(|entry| EntryJson {
                name: entry.name.to_string_lossy(),
                kind: entry.kind.to_string(),
                action: entry.classification,
                outcome: outcome_key(&entry.outcome),
                error: entry.error().map(ToString::to_string),
            })
            .collect(),
        unreadable: report
            .unreadable
            .iter()
            .map(|failure| UnreadableJson {
                name: failure.name.to_string_lossy(),
                error: failure.error.to_string(),
            })
            .collect(),
        source: &report.summary,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize pass JSON")?
    );
    Ok(())
}

fn outcome_key(outcome: &EntryOutcome) -> &'static str {
    match outcome {
        EntryOutcome::Unchanged => "unchanged",
        EntryOutcome::Applied => "applied",
        EntryOutcome::WouldApply => "would_apply",
        EntryOutcome::Failed { .. } => "failed",
    }
}

fn print_report(report: &PassReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let stats = report.stats();

    if report.entries.is_empty() && report.unreadable.is_empty() {
        println!("{prefix}✓ nothing to mirror");
    } else {
        println!(
            "{prefix}✓ pass finished ({} created, {} updated, {} up-to-date, {} deleted, {} failed)",
            stats.created, stats.updated, stats.up_to_date, stats.deleted, stats.failed
        );
    }

    for entry in &report.entries {
        let marker = match (&entry.outcome, entry.classification) {
            (EntryOutcome::Failed { .. }, _) => "✗".red().bold(),
            (EntryOutcome::Unchanged, _) => "·".bright_black(),
            (_, Classification::Create) => "+".green().bold(),
            (_, Classification::Update) => "~".yellow().bold(),
            (_, Classification::Delete) => "-".red().bold(),
            (_, Classification::UpToDate) => "·".bright_black(),
        };
        let shown = entry.name.to_string_lossy();
        match entry.error() {
            Some(error) => println!("  {marker}  {shown} ({}): {error}", entry.kind),
            None => println!("  {marker}  {shown} ({})", entry.kind),
        }
    }
    for failure in &report.unreadable {
        println!(
            "  {}  {}: {}",
            "?".magenta().bold(),
            failure.name.to_string_lossy(),
            failure.error
        );
    }

    println!("Source folder contains:");
    println!("Files: {:?}", report.summary.files);
    println!("Folders: {:?}", report.summary.folders);
}
