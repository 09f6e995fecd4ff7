//! Per-target sync: clone, copy-if-different, commit, push.
//!
//! Every failure inside one target becomes an [`Outcome`] value; nothing a
//! target does can abort the run. The scratch checkout is a
//! [`ScratchCheckout`] guard, so it is discarded on every return path.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use stencil_core::{Ruleset, SyncPattern, TargetRepo};

use crate::error::{io_err, SyncError};
use crate::scm::SourceControl;
use crate::scratch::ScratchCheckout;
use crate::writer::{copy_if_different, ensure_within, FileAction, WriteMode};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How one target's sync ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum Outcome {
    /// Changes were committed and pushed.
    UpdatedAndPushed,
    /// Every governed file already matched the template.
    NoChangesNeeded,
    /// Changes were computed but not committed.
    DryRunSkipped,
    /// The working copy could not be acquired.
    CloneFailed(String),
    /// A template or checkout file could not be read or written. Nothing was
    /// committed.
    CopyFailed(String),
    /// Staging, committing or pushing failed. The remote is unchanged.
    PushFailed(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::CloneFailed(_) | Outcome::CopyFailed(_) | Outcome::PushFailed(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::UpdatedAndPushed => "updated-and-pushed",
            Outcome::NoChangesNeeded => "no-changes-needed",
            Outcome::DryRunSkipped => "dry-run-skipped",
            Outcome::CloneFailed(_) => "clone-failed",
            Outcome::CopyFailed(_) => "copy-failed",
            Outcome::PushFailed(_) => "push-failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::CloneFailed(reason)
            | Outcome::CopyFailed(reason)
            | Outcome::PushFailed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Outcome of syncing a single target.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub target: TargetRepo,
    pub outcome: Outcome,
    pub files: Vec<FileAction>,
    pub elapsed_ms: u128,
}

impl SyncReport {
    pub fn changed(&self) -> usize {
        self.files.iter().filter(|f| f.is_change()).count()
    }

    pub fn unchanged(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileAction::Unchanged { .. }))
            .count()
    }

    pub fn excluded(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileAction::Excluded { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// RepoSyncer
// ---------------------------------------------------------------------------

/// Where the template lives and where checkouts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub template_dir: PathBuf,
    pub scratch_root: PathBuf,
    /// Attach unified diffs to dry-run file actions.
    pub show_diff: bool,
}

impl SyncOptions {
    pub fn new(template_dir: impl Into<PathBuf>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            scratch_root: scratch_root.into(),
            show_diff: false,
        }
    }
}

/// Brings one target's governed files in line with the template.
pub struct RepoSyncer<'a, S: SourceControl> {
    ruleset: &'a Ruleset,
    scm: &'a S,
    options: SyncOptions,
    dry_run: bool,
}

impl<'a, S: SourceControl> RepoSyncer<'a, S> {
    pub fn new(ruleset: &'a Ruleset, scm: &'a S, options: SyncOptions, dry_run: bool) -> Self {
        Self {
            ruleset,
            scm,
            options,
            dry_run,
        }
    }

    /// Sync one target. Never fails: errors are reported in the outcome.
    pub fn sync(&self, target: &TargetRepo) -> SyncReport {
        let started = Instant::now();
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        info!("{prefix}syncing {target}");

        let mut files = Vec::new();
        let outcome = self.sync_into(target, &mut files);

        match &outcome {
            o if o.is_failure() => warn!("{target}: {} ({})", o.label(), o.reason().unwrap_or("")),
            o => info!("{target}: {}", o.label()),
        }

        SyncReport {
            target: target.clone(),
            outcome,
            files,
            elapsed_ms: started.elapsed().as_millis(),
        }
    }

    fn sync_into(&self, target: &TargetRepo, files: &mut Vec<FileAction>) -> Outcome {
        let checkout = match ScratchCheckout::acquire(&self.options.scratch_root, target) {
            Ok(checkout) => checkout,
            Err(err) => return Outcome::CloneFailed(err.to_string()),
        };

        info!("cloning {target}");
        if let Err(err) = self.scm.clone_repo(target, checkout.path()) {
            return Outcome::CloneFailed(err.to_string());
        }

        if let Err(err) = self.apply_patterns(checkout.path(), files) {
            return Outcome::CopyFailed(err.to_string());
        }

        if !files.iter().any(FileAction::is_change) {
            return Outcome::NoChangesNeeded;
        }

        if self.dry_run {
            let changed = files.iter().filter(|f| f.is_change()).count();
            info!("[dry-run] would commit and push {changed} file(s)");
            return Outcome::DryRunSkipped;
        }

        match self.publish(checkout.path()) {
            Ok(()) => Outcome::UpdatedAndPushed,
            Err(reason) => Outcome::PushFailed(reason),
        }
    }

    /// Stage, commit and push. Nothing reaches the remote unless all three
    /// succeed.
    fn publish(&self, repo: &Path) -> Result<(), String> {
        info!("committing changes");
        self.scm
            .stage_all(repo)
            .map_err(|e| format!("stage failed: {e}"))?;
        self.scm
            .commit(repo, self.ruleset.commit_message())
            .map_err(|e| format!("commit failed: {e}"))?;
        info!("pushing changes");
        self.scm.push(repo).map_err(|e| e.to_string())
    }

    fn apply_patterns(&self, checkout: &Path, files: &mut Vec<FileAction>) -> Result<(), SyncError> {
        let mode = WriteMode {
            dry_run: self.dry_run,
            show_diff: self.options.show_diff,
        };

        for pattern in self.ruleset.sync_patterns() {
            let source = self.options.template_dir.join(pattern.as_path());
            let dest = checkout.join(pattern.as_path());

            let meta = match std::fs::metadata(&source) {
                Ok(meta) => meta,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("template has no {pattern}; skipping");
                    continue;
                }
                Err(e) => return Err(io_err(&source, e)),
            };

            if meta.is_dir() {
                self.sync_directory(checkout, pattern, &source, mode, files)?;
            } else {
                ensure_within(checkout, &dest)?;
                let rel_path = display_root(pattern);
                files.push(copy_if_different(&source, &dest, rel_path, mode)?);
            }
        }
        Ok(())
    }

    fn sync_directory(
        &self,
        checkout: &Path,
        pattern: &SyncPattern,
        source: &Path,
        mode: WriteMode,
        files: &mut Vec<FileAction>,
    ) -> Result<(), SyncError> {
        let exclusions = self.ruleset.exclusions();
        let root = display_root(pattern);
        let dest = checkout.join(pattern.as_path());

        for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|source_err| SyncError::Walk {
                path: source.to_path_buf(),
                source: source_err,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let rel_path = root.join(relative);

            if let Some(glob) = exclusions.matching(relative) {
                info!("skipping (excluded by {glob}): {}", rel_path.display());
                files.push(FileAction::Excluded {
                    path: rel_path,
                    pattern: glob.to_string(),
                });
                continue;
            }

            let target_path = dest.join(relative);
            ensure_within(checkout, &target_path)?;
            files.push(copy_if_different(entry.path(), &target_path, rel_path, mode)?);
        }
        Ok(())
    }
}

/// Repository-relative path of a pattern, without its trailing `/`.
fn display_root(pattern: &SyncPattern) -> PathBuf {
    PathBuf::from(pattern.0.trim_end_matches('/'))
}
