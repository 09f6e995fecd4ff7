//! Domain types for the stencil ruleset.
//!
//! Sync patterns are kept as the relative strings the ruleset declares them
//! with; conversion to a filesystem path happens at the edge via
//! [`SyncPattern::as_path`].

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::RulesetError;

// ---------------------------------------------------------------------------
// TargetRepo
// ---------------------------------------------------------------------------

/// A downstream repository that receives template files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRepo {
    pub owner: String,
    pub name: String,
}

impl TargetRepo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `name` or `owner/name`, filling in `default_owner` for bare names.
    pub fn parse(id: &str, default_owner: &str) -> Result<Self, RulesetError> {
        let id = id.trim();
        let (owner, name) = match id.split_once('/') {
            Some((owner, name)) => (owner, name),
            None => (default_owner, id),
        };
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(RulesetError::InvalidTarget(id.to_string()));
        }
        Ok(Self::new(owner, name))
    }

    /// `owner/name`, the form handed to the source-control client.
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// True when `id` names this repository, either bare or owner-qualified.
    pub fn matches(&self, id: &str) -> bool {
        match id.split_once('/') {
            Some((owner, name)) => owner == self.owner && name == self.name,
            None => id == self.name,
        }
    }
}

impl fmt::Display for TargetRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// SyncPattern
// ---------------------------------------------------------------------------

/// A template-relative path to propagate: a directory or a single file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncPattern(pub String);

impl SyncPattern {
    /// Reject patterns that could write outside the target checkout.
    pub fn validate(&self) -> Result<(), RulesetError> {
        let invalid = |reason| RulesetError::InvalidPattern {
            pattern: self.0.clone(),
            reason,
        };
        if self.0.trim().is_empty() {
            return Err(invalid("pattern is empty"));
        }
        let path = Path::new(&self.0);
        if path.is_absolute() || self.0.starts_with('/') {
            return Err(invalid("pattern must be relative"));
        }
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(invalid("pattern must not contain '..'"));
        }
        Ok(())
    }

    pub fn as_path(&self) -> &Path {
        Path::new(self.0.as_str())
    }

    /// The ruleset marks directories with a trailing `/`. The template tree
    /// still decides at sync time.
    pub fn is_directory_hint(&self) -> bool {
        self.0.ends_with('/')
    }
}

impl fmt::Display for SyncPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SyncPattern {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SyncPattern {
    fn from(s: String) -> Self {
        Self(s)
    }
}
