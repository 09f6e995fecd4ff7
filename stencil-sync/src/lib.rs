//! # stencil-sync
//!
//! Clone, copy-if-different, commit and push for every selected target.
//!
//! Call [`RepoSyncer::sync`] to bring one target in line with the template,
//! or [`pipeline::run`] to fold every selected target into a [`RunSummary`].

pub mod diff;
pub mod error;
pub mod pipeline;
pub mod scm;
pub mod scratch;
pub mod syncer;
pub mod writer;

pub use error::SyncError;
pub use pipeline::{Progress, RunSummary};
pub use scm::{CliScm, CloneStrategy, CommitIdentity, ScmError, SourceControl};
pub use scratch::ScratchCheckout;
pub use syncer::{Outcome, RepoSyncer, SyncOptions, SyncReport};
pub use writer::FileAction;
