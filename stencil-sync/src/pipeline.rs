//! Run-level entrypoint: resolve the selection, sync each target in turn,
//! and fold the reports into a [`RunSummary`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use stencil_core::{RunConfig, Ruleset, Selected};

use crate::scm::SourceControl;
use crate::syncer::{RepoSyncer, SyncOptions, SyncReport};

/// Aggregate result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub reports: Vec<SyncReport>,
    /// Selected identifiers not in the registry. Counted neither as
    /// successes nor as failures.
    pub unknown: Vec<String>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| !r.outcome.is_failure())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.is_failure())
            .count()
    }

    /// `0` when no processed target failed, `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.failed() == 0 {
            0
        } else {
            1
        }
    }
}

/// Reported as each selected identifier is reached.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// The identifier is not in the registry and was skipped.
    Unknown(&'a str),
    /// One target finished syncing.
    Synced(&'a SyncReport),
}

/// Sync every selected target sequentially.
///
/// Unknown identifiers are warned about and skipped. A failing target is
/// recorded and the run moves on to the next one.
pub fn run<S: SourceControl>(
    ruleset: &Ruleset,
    scm: &S,
    options: SyncOptions,
    config: &RunConfig,
) -> RunSummary {
    run_with_progress(ruleset, scm, options, config, |_| {})
}

/// [`run`], calling `on_progress` in selection order as targets finish and
/// unknown identifiers are reached.
pub fn run_with_progress<S, F>(
    ruleset: &Ruleset,
    scm: &S,
    options: SyncOptions,
    config: &RunConfig,
    mut on_progress: F,
) -> RunSummary
where
    S: SourceControl,
    F: FnMut(Progress<'_>),
{
    let started_at = Utc::now();
    let resolution = ruleset.resolve(&config.selection);
    let syncer = RepoSyncer::new(ruleset, scm, options, config.dry_run);

    let mut reports = Vec::with_capacity(resolution.targets.len());
    for selected in &resolution.order {
        match selected {
            Selected::Unknown(id) => {
                warn!("unknown repo: {id}");
                on_progress(Progress::Unknown(id));
            }
            Selected::Target(target) => {
                let report = syncer.sync(target);
                on_progress(Progress::Synced(&report));
                reports.push(report);
            }
        }
    }

    RunSummary {
        started_at,
        dry_run: config.dry_run,
        reports,
        unknown: resolution.unknown,
    }
}
