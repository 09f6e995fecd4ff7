//! Error types for stencil-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while building or loading a ruleset.
#[derive(Debug, Error)]
pub enum RulesetError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse ruleset at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The ruleset file did not exist at the given path.
    #[error("ruleset not found at {path}")]
    NotFound { path: PathBuf },

    /// An exclusion pattern is not a valid glob.
    #[error("invalid exclusion glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A sync pattern is empty, absolute, or escapes the repository root.
    #[error("invalid sync pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    /// A target entry could not be read as `name` or `owner/name`.
    #[error("invalid target identifier '{0}'")]
    InvalidTarget(String),
}
