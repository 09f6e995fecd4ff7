//! Stencil core library: target registry, sync ruleset and run configuration.
//!
//! - [`types`]: target repositories and sync patterns
//! - [`ruleset`]: the built-in ruleset, YAML loading, target resolution
//! - [`exclusion`]: exclusion glob matching
//! - [`config`]: `DRY_RUN` / `TARGET_REPOS` parsing
//! - [`error`]: [`RulesetError`]

pub mod config;
pub mod error;
pub mod exclusion;
pub mod ruleset;
pub mod types;

pub use config::{parse_dry_run, RunConfig, TargetSelection};
pub use error::RulesetError;
pub use exclusion::ExclusionSet;
pub use ruleset::{Resolution, Ruleset, Selected};
pub use types::{SyncPattern, TargetRepo};
