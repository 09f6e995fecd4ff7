//! Source-control client seam.
//!
//! Stencil never talks to a remote itself. Cloning, staging, committing and
//! pushing are delegated to external CLI tools that carry their own
//! transport and credentials. [`SourceControl`] is the seam the syncer
//! depends on; [`CliScm`] is the real implementation.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output};

use thiserror::Error;
use tracing::debug;

use stencil_core::TargetRepo;

/// Default URL template for [`CloneStrategy::Git`].
pub const DEFAULT_REMOTE_TEMPLATE: &str = "https://github.com/{repo}.git";

/// Errors from running an external source-control command.
#[derive(Debug, Error)]
pub enum ScmError {
    /// The program is not installed or not on `PATH`.
    #[error("{program} not installed or not in PATH")]
    NotFound { program: String },

    /// The program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited non-zero.
    #[error("`{command}` exited with code {code}: {output}")]
    Failed {
        command: String,
        code: i32,
        output: String,
    },
}

/// Operations the syncer needs from a source-control client.
pub trait SourceControl {
    /// Clone `target` into `dest`, which does not exist yet.
    fn clone_repo(&self, target: &TargetRepo, dest: &Path) -> Result<(), ScmError>;

    /// Stage every change in the working copy.
    fn stage_all(&self, repo: &Path) -> Result<(), ScmError>;

    /// Commit the staged changes.
    fn commit(&self, repo: &Path, message: &str) -> Result<(), ScmError>;

    /// Push the current branch to its default remote.
    fn push(&self, repo: &Path) -> Result<(), ScmError>;
}

// ---------------------------------------------------------------------------
// CliScm
// ---------------------------------------------------------------------------

/// How [`CliScm`] acquires a working copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CloneStrategy {
    /// `gh repo clone owner/name <dest>`, using the GitHub CLI's auth.
    #[default]
    Gh,
    /// `git clone <url> <dest>`, with the URL rendered from a template that
    /// may contain `{owner}`, `{name}` and `{repo}` (= `owner/name`).
    Git { remote_template: String },
}

/// Author/committer identity passed to `git commit` via `-c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

/// [`SourceControl`] backed by the `gh` and `git` command-line tools.
#[derive(Debug, Clone, Default)]
pub struct CliScm {
    strategy: CloneStrategy,
    identity: Option<CommitIdentity>,
}

impl CliScm {
    pub fn new(strategy: CloneStrategy) -> Self {
        Self {
            strategy,
            identity: None,
        }
    }

    pub fn with_identity(mut self, identity: CommitIdentity) -> Self {
        self.identity = Some(identity);
        self
    }
}

impl SourceControl for CliScm {
    fn clone_repo(&self, target: &TargetRepo, dest: &Path) -> Result<(), ScmError> {
        let dest = dest.to_string_lossy();
        match &self.strategy {
            CloneStrategy::Gh => {
                let id = target.identifier();
                run("gh", &["repo", "clone", &id, &dest], None)
            }
            CloneStrategy::Git { remote_template } => {
                let url = render_remote(remote_template, target);
                run("git", &["clone", "--quiet", &url, &dest], None)
            }
        }
    }

    fn stage_all(&self, repo: &Path) -> Result<(), ScmError> {
        run("git", &["add", "--all"], Some(repo))
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<(), ScmError> {
        let mut args: Vec<String> = Vec::new();
        if let Some(identity) = &self.identity {
            args.push("-c".to_string());
            args.push(format!("user.name={}", identity.name));
            args.push("-c".to_string());
            args.push(format!("user.email={}", identity.email));
        }
        args.extend([
            "commit".to_string(),
            "--quiet".to_string(),
            "-m".to_string(),
            message.to_string(),
        ]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run("git", &args, Some(repo))
    }

    fn push(&self, repo: &Path) -> Result<(), ScmError> {
        run("git", &["push", "--quiet"], Some(repo))
    }
}

/// Substitute `{owner}`, `{name}` and `{repo}` in a remote URL template.
pub fn render_remote(template: &str, target: &TargetRepo) -> String {
    template
        .replace("{repo}", &target.identifier())
        .replace("{owner}", &target.owner)
        .replace("{name}", &target.name)
}

fn run(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<(), ScmError> {
    debug!("running {}", describe(program, args));
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command.output().map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ScmError::NotFound {
                program: program.to_string(),
            }
        } else {
            ScmError::Spawn {
                program: program.to_string(),
                source,
            }
        }
    })?;
    check_output(program, args, output)
}

fn check_output(program: &str, args: &[&str], output: Output) -> Result<(), ScmError> {
    if output.status.success() {
        return Ok(());
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let combined = match (stdout.is_empty(), stderr.is_empty()) {
        (false, false) => format!("{stdout}\n{stderr}"),
        (false, true) => stdout,
        _ => stderr,
    };
    Err(ScmError::Failed {
        command: describe(program, args),
        code: output.status.code().unwrap_or(-1),
        output: combined,
    })
}

/// Program and subcommand only; clone URLs may embed credentials.
fn describe(program: &str, args: &[&str]) -> String {
    match args.iter().find(|a| !a.starts_with('-') && !a.contains('=')) {
        Some(sub) => format!("{program} {sub}"),
        None => program.to_string(),
    }
}
