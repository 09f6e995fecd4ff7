//! Scoped scratch checkout.
//!
//! Each target is cloned into `<scratch_root>/<owner>__<name>`. Acquiring the
//! checkout destroys whatever a previous run left at that path; dropping it
//! removes the directory again, so every exit from a sync (pushed, no-op,
//! dry-run, clone/copy/push failure, or a panic unwinding through the
//! syncer) leaves nothing behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use stencil_core::TargetRepo;

use crate::error::{io_err, SyncError};

/// A per-target working directory that is deleted on drop.
#[derive(Debug)]
pub struct ScratchCheckout {
    path: PathBuf,
}

impl ScratchCheckout {
    /// Reserve a pristine scratch path for `target` under `root`.
    ///
    /// The returned path does not exist yet; the clone creates it.
    pub fn acquire(root: &Path, target: &TargetRepo) -> Result<Self, SyncError> {
        let path = path_for(root, target);
        if path.symlink_metadata().is_ok() {
            debug!("removing stale scratch checkout {}", path.display());
            remove(&path)?;
        }
        std::fs::create_dir_all(root).map_err(|e| io_err(root, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchCheckout {
    fn drop(&mut self) {
        match remove(&self.path) {
            Ok(()) => debug!("discarded scratch checkout {}", self.path.display()),
            Err(err) => warn!("failed to discard scratch checkout: {err}"),
        }
    }
}

/// `<root>/<owner>__<name>`
pub fn path_for(root: &Path, target: &TargetRepo) -> PathBuf {
    root.join(format!("{}__{}", target.owner, target.name))
}

fn remove(path: &Path) -> Result<(), SyncError> {
    let meta = match path.symlink_metadata() {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_err(path, e)),
    };
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(path, e)),
    }
}
