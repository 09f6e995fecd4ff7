//! Error types for stencil-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Filesystem errors raised while preparing a checkout or copying files.
///
/// These never cross the pipeline loop; the syncer turns them into a
/// per-target [`Outcome`](crate::Outcome).
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Recursive enumeration of a template directory failed.
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A destination path runs through a symlink in the checkout.
    #[error("refusing to write through symlink at {path}")]
    Symlink { path: PathBuf },

    /// A destination path does not lie below the checkout root.
    #[error("{path} is outside the checkout")]
    OutsideCheckout { path: PathBuf },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
