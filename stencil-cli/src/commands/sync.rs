//! `stencil sync`: propagate template files to the selected targets.

use std::convert::Infallible;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, ValueEnum};
use colored::Colorize;
use tracing::debug;

use stencil_core::{parse_dry_run, RunConfig, TargetSelection};
use stencil_sync::{
    pipeline, scm::DEFAULT_REMOTE_TEMPLATE, CliScm, CloneStrategy, CommitIdentity, FileAction,
    Progress, RunSummary, SyncOptions, SyncReport,
};

const RULE: &str = "============================================================";

/// Which CLI tool acquires working copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClientKind {
    /// `gh repo clone owner/name`
    Gh,
    /// `git clone <url>` using `--remote-template`
    Git,
}

/// Arguments for `stencil sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Compute and report changes without committing or pushing.
    /// Only the value `true` (any case) enables it.
    #[arg(
        long,
        env = "DRY_RUN",
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = dry_run_value,
    )]
    pub dry_run: bool,

    /// `all`, or a comma-separated list of `name` / `owner/name` targets.
    #[arg(long, env = "TARGET_REPOS", value_name = "LIST", default_value = "all")]
    pub targets: TargetSelection,

    /// Root of the template repository. Defaults to the current directory.
    #[arg(long, env = "TEMPLATE_DIR", value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    /// Where scratch checkouts are cloned. Defaults to `<tmp>/stencil`.
    #[arg(long, env = "SCRATCH_DIR", value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// YAML ruleset replacing the built-in targets and patterns.
    #[arg(long, env = "STENCIL_RULESET", value_name = "FILE")]
    pub ruleset: Option<PathBuf>,

    /// Tool used to clone targets.
    #[arg(long, env = "STENCIL_CLIENT", value_enum, default_value = "gh")]
    pub client: ClientKind,

    /// Clone URL for `--client git`; `{owner}`, `{name}` and `{repo}` are substituted.
    #[arg(
        long,
        env = "STENCIL_REMOTE_TEMPLATE",
        value_name = "URL",
        default_value = DEFAULT_REMOTE_TEMPLATE,
    )]
    pub remote_template: String,

    /// Commit author name (requires `--author-email`).
    #[arg(long, env = "STENCIL_AUTHOR_NAME", requires = "author_email")]
    pub author_name: Option<String>,

    /// Commit author email (requires `--author-name`).
    #[arg(long, env = "STENCIL_AUTHOR_EMAIL", requires = "author_name")]
    pub author_email: Option<String>,

    /// Print unified diffs of files a dry run would change.
    #[arg(long)]
    pub diff: bool,

    /// Emit the run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

fn dry_run_value(raw: &str) -> Result<bool, Infallible> {
    Ok(parse_dry_run(raw))
}

impl SyncArgs {
    pub fn run(self) -> Result<ExitCode> {
        let ruleset = super::load_ruleset(self.ruleset.as_deref())?;

        let template_dir = match self.template_dir.clone() {
            Some(dir) => dir,
            None => std::env::current_dir().context("could not determine current directory")?,
        };
        if !template_dir.is_dir() {
            bail!("template directory {} does not exist", template_dir.display());
        }
        let scratch_root = self
            .scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("stencil"));

        debug!(
            template = %template_dir.display(),
            scratch = %scratch_root.display(),
            "resolved directories"
        );
        let mut options = SyncOptions::new(template_dir, scratch_root);
        options.show_diff = self.diff;

        let config = RunConfig {
            dry_run: self.dry_run,
            selection: self.targets.clone(),
        };

        let scm = self.scm();
        if self.json {
            let summary = pipeline::run(&ruleset, &scm, options, &config);
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("failed to encode summary")?
            );
            return Ok(ExitCode::from(summary.exit_code()));
        }

        print_banner(&config, ruleset.resolve(&config.selection).targets.len());
        let show_diff = self.diff;
        let summary =
            pipeline::run_with_progress(&ruleset, &scm, options, &config, |progress| {
                match progress {
                    Progress::Unknown(id) => println!("\n{} unknown repo: {id}", "⚠".yellow()),
                    Progress::Synced(report) => print_report(report, config.dry_run, show_diff),
                }
            });
        print_footer(&summary);

        Ok(ExitCode::from(summary.exit_code()))
    }

    fn scm(&self) -> CliScm {
        let strategy = match self.client {
            ClientKind::Gh => CloneStrategy::Gh,
            ClientKind::Git => CloneStrategy::Git {
                remote_template: self.remote_template.clone(),
            },
        };
        let scm = CliScm::new(strategy);
        match (&self.author_name, &self.author_email) {
            (Some(name), Some(email)) => scm.with_identity(CommitIdentity {
                name: name.clone(),
                email: email.clone(),
            }),
            _ => scm,
        }
    }
}

fn print_banner(config: &RunConfig, target_count: usize) {
    println!("{RULE}");
    println!("Syncing template to downstream repositories");
    println!("{RULE}");
    println!(
        "Mode: {}",
        if config.dry_run { "DRY RUN" } else { "LIVE" }
    );
    match &config.selection {
        TargetSelection::All => println!("Target repos: {target_count} (all)"),
        TargetSelection::Named(_) => println!("Target repos: {target_count}"),
    }
    println!("{RULE}");
}

fn print_footer(summary: &RunSummary) {
    println!("\n{RULE}");
    let failed = summary.failed();
    let line = format!(
        "Sync complete: {} succeeded, {} failed",
        summary.succeeded(),
        failed
    );
    if failed == 0 {
        println!("{}", line.green());
    } else {
        println!("{}", line.red());
    }
    println!("{RULE}");
}

fn print_report(report: &SyncReport, dry_run: bool, show_diff: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let status = report.outcome.label();
    println!();
    match report.outcome.reason() {
        Some(reason) => println!(
            "{prefix}{} '{}': {status}: {reason}",
            "✗".red(),
            report.target
        ),
        None => println!(
            "{prefix}{} '{}': {status} ({} changed, {} unchanged, {} excluded)",
            "✓".green(),
            report.target,
            report.changed(),
            report.unchanged(),
            report.excluded()
        ),
    }

    for file in &report.files {
        match file {
            FileAction::Written { path } => println!("  ✎  {}", path.display()),
            FileAction::WouldWrite { path, diff } => {
                println!("  ~  {}", path.display());
                if let (true, Some(diff)) = (show_diff, diff) {
                    print_diff(diff);
                }
            }
            FileAction::Unchanged { path } => println!("  ·  {}", path.display()),
            FileAction::Excluded { path, pattern } => {
                println!("  ⏭  {} (excluded by {pattern})", path.display())
            }
        }
    }
}

fn print_diff(diff: &str) {
    for line in diff.lines() {
        let rendered = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with("@@") {
            line.cyan()
        } else {
            line.normal()
        };
        println!("     {rendered}");
    }
}
