//! Shared fixtures: a recording fake source-control client and temp trees.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use stencil_core::TargetRepo;
use stencil_sync::{ScmError, SourceControl, SyncOptions};
use tempfile::TempDir;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Clone(String),
    Stage,
    Commit,
    Push(String),
}

#[derive(Debug, Clone)]
pub struct Commit {
    pub target: String,
    pub message: String,
    pub files: BTreeMap<PathBuf, Vec<u8>>,
}

/// Clones by copying `<remotes>/<name>/`, records everything else.
pub struct FakeScm {
    remotes: PathBuf,
    fail_clone: HashSet<String>,
    fail_push: HashSet<String>,
    current: RefCell<Option<String>>,
    pub events: RefCell<Vec<Event>>,
    pub checkouts: RefCell<Vec<PathBuf>>,
    pub commits: RefCell<Vec<Commit>>,
    /// Whether the clone destination already existed when clone ran.
    pub dest_preexisted: RefCell<Vec<bool>>,
}

impl FakeScm {
    pub fn new(remotes: &Path) -> Self {
        Self {
            remotes: remotes.to_path_buf(),
            fail_clone: HashSet::new(),
            fail_push: HashSet::new(),
            current: RefCell::new(None),
            events: RefCell::new(Vec::new()),
            checkouts: RefCell::new(Vec::new()),
            commits: RefCell::new(Vec::new()),
            dest_preexisted: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_clone(mut self, name: &str) -> Self {
        self.fail_clone.insert(name.to_string());
        self
    }

    pub fn failing_push(mut self, name: &str) -> Self {
        self.fail_push.insert(name.to_string());
        self
    }

    pub fn pushes(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Push(_)))
            .count()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.borrow().len()
    }
}

impl SourceControl for FakeScm {
    fn clone_repo(&self, target: &TargetRepo, dest: &Path) -> Result<(), ScmError> {
        self.events.borrow_mut().push(Event::Clone(target.name.clone()));
        self.checkouts.borrow_mut().push(dest.to_path_buf());
        self.dest_preexisted.borrow_mut().push(dest.exists());
        *self.current.borrow_mut() = Some(target.name.clone());

        if self.fail_clone.contains(&target.name) {
            // Leave a half-finished clone behind, like an interrupted transfer.
            fs::create_dir_all(dest.join(".git")).expect("partial clone");
            fs::write(dest.join(".git").join("HEAD"), "ref: refs/heads/main\n")
                .expect("partial clone");
            return Err(ScmError::Failed {
                command: "gh repo".to_string(),
                code: 1,
                output: format!("GraphQL: Could not resolve to a Repository ({target})"),
            });
        }

        fs::create_dir_all(dest).expect("create checkout");
        let remote = self.remotes.join(&target.name);
        if remote.exists() {
            copy_tree(&remote, dest);
        }
        Ok(())
    }

    fn stage_all(&self, _repo: &Path) -> Result<(), ScmError> {
        self.events.borrow_mut().push(Event::Stage);
        Ok(())
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<(), ScmError> {
        self.events.borrow_mut().push(Event::Commit);
        self.commits.borrow_mut().push(Commit {
            target: self.current.borrow().clone().unwrap_or_default(),
            message: message.to_string(),
            files: snapshot(repo),
        });
        Ok(())
    }

    fn push(&self, _repo: &Path) -> Result<(), ScmError> {
        let current = self.current.borrow().clone().unwrap_or_default();
        if self.fail_push.contains(&current) {
            return Err(ScmError::Failed {
                command: "git push".to_string(),
                code: 1,
                output: "! [rejected] main -> main (non-fast-forward)".to_string(),
            });
        }
        self.events.borrow_mut().push(Event::Push(current));
        Ok(())
    }
}

/// Template, remotes and scratch root for one test.
pub struct Fixture {
    pub template: TempDir,
    pub remotes: TempDir,
    pub scratch: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            template: TempDir::new().expect("template"),
            remotes: TempDir::new().expect("remotes"),
            scratch: TempDir::new().expect("scratch"),
        }
    }

    pub fn template_file(&self, rel: &str, content: &[u8]) {
        write(self.template.path(), rel, content);
    }

    pub fn remote_file(&self, repo: &str, rel: &str, content: &[u8]) {
        write(&self.remotes.path().join(repo), rel, content);
    }

    /// Make `<remotes>/<repo>/<rel>` a symlink to `target`.
    #[cfg(unix)]
    pub fn remote_symlink(&self, repo: &str, rel: &str, target: &Path) {
        let link = self.remotes.path().join(repo).join(rel);
        fs::create_dir_all(link.parent().expect("parent")).expect("mkdir");
        std::os::unix::fs::symlink(target, link).expect("symlink");
    }

    pub fn options(&self) -> SyncOptions {
        SyncOptions::new(self.template.path(), self.scratch.path())
    }

    pub fn scm(&self) -> FakeScm {
        FakeScm::new(self.remotes.path())
    }
}

pub fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

pub fn copy_tree(from: &Path, to: &Path) {
    for entry in WalkDir::new(from) {
        let entry = entry.expect("walk");
        let rel = entry.path().strip_prefix(from).expect("prefix");
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).expect("mkdir");
        } else if entry.file_type().is_symlink() {
            copy_symlink(entry.path(), &dest);
        } else {
            fs::copy(entry.path(), &dest).expect("copy");
        }
    }
}

#[cfg(unix)]
fn copy_symlink(link: &Path, dest: &Path) {
    let target = fs::read_link(link).expect("read link");
    std::os::unix::fs::symlink(target, dest).expect("symlink");
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, dest: &Path) {
    fs::copy(link, dest).expect("copy");
}

pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).expect("prefix").to_path_buf();
            (rel, fs::read(e.path()).expect("read"))
        })
        .collect()
}
