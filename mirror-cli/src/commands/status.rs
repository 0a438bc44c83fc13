//! `mirror status`: preview the next pass without mutating either root.

use std::borrow::Cow;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use mirror_core::{config::ConfigLayer, Classification, EntryKind};
use mirror_sync::{compare::compare_existing, Comparison, PlannedEntry};

use super::RootArgs;

/// Arguments for `mirror status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub roots: RootArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = self.roots.resolve(ConfigLayer::default())?;
        let comparison = compare_existing(&config.roots()).with_context(|| {
            format!(
                "failed to compare {} with {}",
                config.source.display(),
                config.replica.display()
            )
        })?;

        if self.json {
            return print_json(&comparison);
        }
        print_table(&comparison);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    pending: usize,
    entries: Vec<EntryStatusJson<'a>>,
    unreadable: Vec<UnreadableJson<'a>>,
}

#[derive(Serialize)]
struct EntryStatusJson<'a> {
    name: Cow<'a, str>,
    kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    replica_kind: Option<EntryKind>,
    action: Classification,
}

#[derive(Serialize)]
struct UnreadableJson<'a> {
    name: Cow<'a, str>,
    error: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "entry")]
    entry: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "action")]
    action: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_json(comparison: &Comparison) -> Result<()> {
    let payload = StatusJson {
        pending: comparison.pending().count(),
        entries: comparison
            .entries
            .iter()
            .map(|entry| EntryStatusJson {
                name: entry.name.to_string_lossy(),
                kind: entry.kind,
                replica_kind: entry.replica_kind,
                action: entry.classification,
            })
            .collect(),
        unreadable: comparison
            .unreadable
            .iter()
            .map(|failure| UnreadableJson {
                name: failure.name.to_string_lossy(),
                error: failure.error.to_string(),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(comparison: &Comparison) {
    let pending = comparison.pending().count();
    println!(
        "Mirror v{} | {} entries | {} pending | {} unreadable",
        env!("CARGO_PKG_VERSION"),
        comparison.entries.len(),
        pending,
        comparison.unreadable.len(),
    );

    if comparison.entries.is_empty() && comparison.unreadable.is_empty() {
        println!("Source and replica are both empty.");
        return;
    }

    println!(
        "Indicators: {} CREATE  {} UPDATE  {} UP-TO-DATE  {} DELETE",
        indicator(Classification::Create),
        indicator(Classification::Update),
        indicator(Classification::UpToDate),
        indicator(Classification::Delete),
    );

    let mut rows: Vec<StatusTableRow> = comparison
        .entries
        .iter()
        .map(|entry| StatusTableRow {
            entry: entry.name.to_string_lossy().into_owned(),
            kind: entry.kind.to_string(),
            action: format!("{} {}", indicator(entry.classification), label(entry.classification)),
            detail: detail(entry),
        })
        .collect();
    rows.extend(comparison.unreadable.iter().map(|failure| StatusTableRow {
        entry: failure.name.to_string_lossy().into_owned(),
        kind: "?".to_string(),
        action: "SKIPPED".to_string(),
        detail: failure.error.to_string(),
    }));

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if pending > 0 {
        println!("Run 'mirror sync' to apply {pending} pending change(s).");
    }
}

fn label(classification: Classification) -> &'static str {
    match classification {
        Classification::Create => "CREATE",
        Classification::Update => "UPDATE",
        Classification::UpToDate => "UP-TO-DATE",
        Classification::Delete => "DELETE",
    }
}

fn indicator(classification: Classification) -> String {
    match classification {
        Classification::Create => "■".green().bold().to_string(),
        Classification::Update => "■".yellow().bold().to_string(),
        Classification::UpToDate => "■".bright_black().bold().to_string(),
        Classification::Delete => "■".red().bold().to_string(),
    }
}

fn detail(entry: &PlannedEntry) -> String {
    match entry.classification {
        Classification::Create => "missing in replica".to_string(),
        Classification::Update if entry.replaces_kind() => format!(
            "replica is a {}, replaced",
            entry.replica_kind.map(|k| k.to_string()).unwrap_or_default()
        ),
        Classification::Update => "source is newer".to_string(),
        Classification::UpToDate => "in sync".to_string(),
        Classification::Delete => "not in source".to_string(),
    }
}
