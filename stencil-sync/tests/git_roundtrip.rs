//! `CliScm` against a real local bare repository.
//!
//! Skipped when `git` is not on `PATH`.

use std::fs;
use std::path::Path;
use std::process::Command;

use stencil_core::{RunConfig, Ruleset, SyncPattern, TargetRepo};
use stencil_sync::{pipeline, CliScm, CloneStrategy, CommitIdentity, Outcome, SyncOptions};
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run `git {args:?}`: {e}"));
    assert!(
        output.status.success(),
        "`git {args:?}` failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// `<root>/remotes/<name>.git` with one commit on `main` containing `files`.
fn seed_remote(root: &Path, name: &str, files: &[(&str, &str)]) {
    let bare = root.join("remotes").join(format!("{name}.git"));
    fs::create_dir_all(&bare).unwrap();
    git(&bare, &["init", "--bare", "--quiet"]);
    git(&bare, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    let seed = root.join("seed").join(name);
    fs::create_dir_all(&seed).unwrap();
    git(&seed, &["init", "--quiet"]);
    git(&seed, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    for (rel, content) in files {
        let path = seed.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    git(&seed, &["add", "--all"]);
    git(
        &seed,
        &[
            "-c",
            "user.name=seed",
            "-c",
            "user.email=seed@example.com",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "--quiet",
            "-m",
            "initial",
        ],
    );
    git(&seed, &["push", "--quiet", bare.to_str().unwrap(), "main"]);
}

fn scm(root: &Path) -> CliScm {
    let template = format!("{}/remotes/{{name}}.git", root.display());
    CliScm::new(CloneStrategy::Git {
        remote_template: template,
    })
    .with_identity(CommitIdentity {
        name: "stencil-bot".into(),
        email: "stencil@example.com".into(),
    })
}

fn rules(targets: &[&str]) -> Ruleset {
    Ruleset::new(
        "jdfalk",
        targets.iter().map(|t| TargetRepo::new("jdfalk", *t)).collect(),
        vec![
            SyncPattern::from(".pre-commit-config.yaml"),
            SyncPattern::from(".github/ISSUE_TEMPLATE/"),
        ],
        &["README.md".to_string()],
        "chore(sync): sync files from template",
    )
    .unwrap()
}

#[test]
fn sync_pushes_one_commit_to_bare_remote() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let root = TempDir::new().unwrap();
    seed_remote(
        root.path(),
        "repoA",
        &[
            (".pre-commit-config.yaml", "repos: []\n"),
            (".github/ISSUE_TEMPLATE/README.md", "repo-specific\n"),
        ],
    );

    let template = TempDir::new().unwrap();
    fs::write(template.path().join(".pre-commit-config.yaml"), "repos: [ruff]\n").unwrap();
    let issue_dir = template.path().join(".github/ISSUE_TEMPLATE");
    fs::create_dir_all(&issue_dir).unwrap();
    fs::write(issue_dir.join("README.md"), "template readme\n").unwrap();
    fs::write(issue_dir.join("bug.yml"), "name: Bug\n").unwrap();

    let scratch = TempDir::new().unwrap();
    let scm = scm(root.path());
    let summary = pipeline::run(
        &rules(&["repoA"]),
        &scm,
        SyncOptions::new(template.path(), scratch.path()),
        &RunConfig::default(),
    );

    assert_eq!(summary.reports[0].outcome, Outcome::UpdatedAndPushed);
    assert_eq!(summary.exit_code(), 0);

    let bare = root.path().join("remotes").join("repoA.git");
    assert_eq!(git(&bare, &["rev-list", "--count", "main"]), "2");
    assert_eq!(
        git(&bare, &["log", "-1", "--format=%s", "main"]),
        "chore(sync): sync files from template"
    );
    assert_eq!(
        git(&bare, &["show", "main:.pre-commit-config.yaml"]),
        "repos: [ruff]"
    );
    assert_eq!(
        git(&bare, &["show", "main:.github/ISSUE_TEMPLATE/README.md"]),
        "repo-specific"
    );
    assert_eq!(
        git(&bare, &["show", "main:.github/ISSUE_TEMPLATE/bug.yml"]),
        "name: Bug"
    );
    assert!(fs::read_dir(scratch.path()).unwrap().next().is_none());

    // A second run finds nothing to do.
    let again = pipeline::run(
        &rules(&["repoA"]),
        &scm,
        SyncOptions::new(template.path(), scratch.path()),
        &RunConfig::default(),
    );
    assert_eq!(again.reports[0].outcome, Outcome::NoChangesNeeded);
    assert_eq!(git(&bare, &["rev-list", "--count", "main"]), "2");
}

#[test]
fn missing_remote_is_clone_failure() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let root = TempDir::new().unwrap();
    let template = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();

    let summary = pipeline::run(
        &rules(&["ghost"]),
        &scm(root.path()),
        SyncOptions::new(template.path(), scratch.path()),
        &RunConfig::default(),
    );

    assert!(matches!(summary.reports[0].outcome, Outcome::CloneFailed(_)));
    assert_eq!(summary.exit_code(), 1);
    assert!(fs::read_dir(scratch.path()).unwrap().next().is_none());
}
