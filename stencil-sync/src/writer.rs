//! Byte-gated atomic writer.
//!
//! ## `copy_if_different` protocol
//!
//! 1. Read the template file.
//! 2. Read the target file (absent counts as different).
//! 3. Compare bytes → skip if identical, leaving the file untouched.
//! 4. Dry-run → report what would be written and stop.
//! 5. Write to `<path>.stencil.tmp` with the template file's permissions.
//! 6. Rename to final path (atomic on POSIX).

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::diff::unified_diff;
use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// File action
// ---------------------------------------------------------------------------

/// What happened to one governed file. Paths are relative to the repository
/// root (sync pattern joined with the file's pattern-relative path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FileAction {
    /// Content differed (or the file was absent) and was written.
    Written { path: PathBuf },
    /// Dry-run: the file *would* have been written. `diff` is present when
    /// diffs were requested and both sides are UTF-8.
    WouldWrite {
        path: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        diff: Option<String>,
    },
    /// Byte-identical; the target file was not touched.
    Unchanged { path: PathBuf },
    /// Matched an exclusion glob; never written.
    Excluded { path: PathBuf, pattern: String },
}

impl FileAction {
    pub fn path(&self) -> &Path {
        match self {
            FileAction::Written { path }
            | FileAction::WouldWrite { path, .. }
            | FileAction::Unchanged { path }
            | FileAction::Excluded { path, .. } => path,
        }
    }

    /// True when this action marks the checkout dirty.
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            FileAction::Written { .. } | FileAction::WouldWrite { .. }
        )
    }
}

/// Writer settings shared by every file of one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteMode {
    pub dry_run: bool,
    pub show_diff: bool,
}

// ---------------------------------------------------------------------------
// copy_if_different
// ---------------------------------------------------------------------------

/// Copy `source` over `dest` unless their bytes already match.
///
/// `rel_path` is the repository-relative path recorded in the result.
pub(crate) fn copy_if_different(
    source: &Path,
    dest: &Path,
    rel_path: PathBuf,
    mode: WriteMode,
) -> Result<FileAction, SyncError> {
    let tmp = PathBuf::from(format!("{}.stencil.tmp", dest.display()));
    copy_with_tmp(source, dest, rel_path, mode, &tmp)
}

fn copy_with_tmp(
    source: &Path,
    dest: &Path,
    rel_path: PathBuf,
    mode: WriteMode,
    tmp: &Path,
) -> Result<FileAction, SyncError> {
    let content = std::fs::read(source).map_err(|e| io_err(source, e))?;
    let current = read_existing(dest)?;

    if current.as_deref() == Some(content.as_slice()) {
        debug!("unchanged: {}", rel_path.display());
        return Ok(FileAction::Unchanged { path: rel_path });
    }

    if mode.dry_run {
        info!("[dry-run] would update: {}", rel_path.display());
        let diff = if mode.show_diff {
            unified_diff(&rel_path, current.as_deref(), &content)
        } else {
            None
        };
        return Ok(FileAction::WouldWrite {
            path: rel_path,
            diff,
        });
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, &content).map_err(|e| io_err(tmp, e))?;

    let permissions = std::fs::metadata(source)
        .map_err(|e| io_err(source, e))?
        .permissions();
    if let Err(e) = std::fs::set_permissions(tmp, permissions) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(tmp, e));
    }

    if let Err(e) = std::fs::rename(tmp, dest) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(dest, e));
    }

    info!("updated: {}", rel_path.display());
    Ok(FileAction::Written { path: rel_path })
}

/// Fail if `dest` leaves `root` or any existing component of it below
/// `root` is a symlink. Components that do not exist yet are created as
/// plain directories by the writer.
pub(crate) fn ensure_within(root: &Path, dest: &Path) -> Result<(), SyncError> {
    let outside = || SyncError::OutsideCheckout {
        path: dest.to_path_buf(),
    };
    let relative = dest.strip_prefix(root).map_err(|_| outside())?;

    let mut current = root.to_path_buf();
    for component in relative.components() {
        let Component::Normal(part) = component else {
            return Err(outside());
        };
        current.push(part);
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(SyncError::Symlink { path: current });
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => break,
            Err(e) => return Err(io_err(&current, e)),
        }
    }
    Ok(())
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
