use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stencil_core::Ruleset;

/// Arguments for `stencil targets`.
#[derive(Args, Debug)]
pub struct TargetsArgs {
    /// YAML ruleset replacing the built-in targets and patterns.
    #[arg(long, env = "STENCIL_RULESET", value_name = "FILE")]
    pub ruleset: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct RulesetView<'a> {
    owner: &'a str,
    targets: Vec<String>,
    sync_patterns: Vec<&'a str>,
    exclusions: &'a [String],
}

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "repository")]
    repository: String,
}

impl TargetsArgs {
    pub fn run(self) -> Result<()> {
        let ruleset = super::load_ruleset(self.ruleset.as_deref())?;
        if self.json {
            let view = RulesetView {
                owner: ruleset.owner(),
                targets: ruleset.targets().iter().map(|t| t.identifier()).collect(),
                sync_patterns: ruleset.sync_patterns().iter().map(|p| p.0.as_str()).collect(),
                exclusions: ruleset.exclusions().patterns(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&view).context("failed to encode ruleset")?
            );
            return Ok(());
        }
        render(&ruleset);
        Ok(())
    }
}

fn render(ruleset: &Ruleset) {
    println!(
        "{} ({} repositories)",
        "Targets".bold(),
        ruleset.targets().len()
    );
    let rows: Vec<TargetRow> = ruleset
        .targets()
        .iter()
        .enumerate()
        .map(|(i, target)| TargetRow {
            index: i + 1,
            repository: target.identifier(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    println!("\n{}", "Synced paths".bold());
    for pattern in ruleset.sync_patterns() {
        println!("  {pattern}");
    }

    println!("\n{}", "Excluded".bold());
    if ruleset.exclusions().is_empty() {
        println!("  (none)");
    }
    for pattern in ruleset.exclusions().patterns() {
        println!("  {pattern}");
    }
}
