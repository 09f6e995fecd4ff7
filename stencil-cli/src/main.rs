//! Stencil: propagate template configuration files to downstream repositories.
//!
//! # Usage
//!
//! ```text
//! stencil sync [--dry-run[=BOOL]] [--targets all|a,b,owner/c] [--template-dir DIR]
//!              [--scratch-dir DIR] [--ruleset FILE] [--client gh|git]
//!              [--remote-template URL] [--diff] [--json]
//! stencil targets [--ruleset FILE] [--json]
//! ```
//!
//! `DRY_RUN` and `TARGET_REPOS` are read from the environment when the
//! matching flags are absent.

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{sync::SyncArgs, targets::TargetsArgs};

#[derive(Parser, Debug)]
#[command(
    name = "stencil",
    version,
    about = "Sync standard files from a template repository into downstream repositories",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone each target, copy template files in, commit and push.
    Sync(SyncArgs),

    /// List the target registry, synced paths and exclusions.
    Targets(TargetsArgs),
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Targets(args) => args.run().map(|()| ExitCode::SUCCESS),
    }
}

/// Logs go to stderr so stdout stays clean for `--json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
