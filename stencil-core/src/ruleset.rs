//! Target registry and sync ruleset.
//!
//! A [`Ruleset`] is built once at process start, either from the built-in
//! tables ([`Ruleset::builtin`]) or from a YAML file ([`Ruleset::load_at`]),
//! and is read-only afterwards.
//!
//! # File format
//!
//! ```yaml
//! owner: jdfalk                  # optional, default owner for bare names
//! targets:                       # required
//!   - release-go-action
//!   - acme/widgets
//! sync_patterns:                 # optional, defaults to the built-in list
//!   - .github/ISSUE_TEMPLATE/
//!   - .pre-commit-config.yaml
//! exclusions:                    # optional, defaults to the built-in list
//!   - README.md
//! commit_message: "chore: sync"  # optional
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::config::TargetSelection;
use crate::error::RulesetError;
use crate::exclusion::ExclusionSet;
use crate::types::{SyncPattern, TargetRepo};

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

const DEFAULT_OWNER: &str = "jdfalk";

const ACTION_REPOS: &[&str] = &[
    "auto-module-tagging-action",
    "ci-generate-matrices-action",
    "ci-workflow-helpers-action",
    "detect-languages-action",
    "docs-generator-action",
    "generate-version-action",
    "get-frontend-config-action",
    "load-config-action",
    "package-assets-action",
    "pr-auto-label-action",
    "release-docker-action",
    "release-frontend-action",
    "release-go-action",
    "release-protobuf-action",
    "release-python-action",
    "release-rust-action",
    "release-strategy-action",
    "security-summary-action",
    "update-action-docker-ref-action",
];

const SYNC_PATTERNS: &[&str] = &[
    ".github/instructions/",
    ".github/agents/",
    ".github/ISSUE_TEMPLATE/",
    ".github/dependabot.yml",
    ".pre-commit-config.yaml",
    ".yamllint",
    ".prettierrc",
    "ruff.toml",
];

/// Repo-specific files that are never overwritten.
const EXCLUDE_PATTERNS: &[&str] = &[
    "*.local.instructions.md",
    ".github/workflows/",
    "README.md",
];

const COMMIT_MESSAGE: &str = "chore(sync): sync files from jft-github-actions template\n\n\
Automated sync of standard files from template repository.";

// ---------------------------------------------------------------------------
// Ruleset
// ---------------------------------------------------------------------------

/// Registered targets plus the patterns that govern what gets copied.
#[derive(Debug, Clone)]
pub struct Ruleset {
    owner: String,
    targets: Vec<TargetRepo>,
    sync_patterns: Vec<SyncPattern>,
    exclusions: ExclusionSet,
    commit_message: String,
}

/// Result of resolving a [`TargetSelection`] against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    /// Registered targets to sync, in processing order.
    pub targets: Vec<TargetRepo>,
    /// Selected identifiers that are not in the registry.
    pub unknown: Vec<String>,
    /// Both of the above, interleaved in selection order.
    pub order: Vec<Selected>,
}

/// One entry of a resolved selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selected {
    Target(TargetRepo),
    Unknown(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesetFile {
    #[serde(default)]
    owner: Option<String>,
    targets: Vec<String>,
    #[serde(default)]
    sync_patterns: Option<Vec<String>>,
    #[serde(default)]
    exclusions: Option<Vec<String>>,
    #[serde(default)]
    commit_message: Option<String>,
}

impl Ruleset {
    pub fn new(
        owner: impl Into<String>,
        targets: Vec<TargetRepo>,
        sync_patterns: Vec<SyncPattern>,
        exclusions: &[String],
        commit_message: impl Into<String>,
    ) -> Result<Self, RulesetError> {
        for pattern in &sync_patterns {
            pattern.validate()?;
        }
        Ok(Self {
            owner: owner.into(),
            targets,
            sync_patterns,
            exclusions: ExclusionSet::new(exclusions)?,
            commit_message: commit_message.into(),
        })
    }

    /// The tables compiled into the binary.
    pub fn builtin() -> Result<Self, RulesetError> {
        Ok(Self {
            owner: DEFAULT_OWNER.to_string(),
            targets: ACTION_REPOS
                .iter()
                .map(|name| TargetRepo::new(DEFAULT_OWNER, *name))
                .collect(),
            sync_patterns: SYNC_PATTERNS.iter().map(|p| SyncPattern::from(*p)).collect(),
            exclusions: ExclusionSet::new(EXCLUDE_PATTERNS)?,
            commit_message: COMMIT_MESSAGE.to_string(),
        })
    }

    /// Load a ruleset from YAML. Omitted optional fields take built-in values.
    ///
    /// Returns `RulesetError::NotFound` if absent, `RulesetError::Parse`
    /// (with path + line context) if malformed.
    pub fn load_at(path: &Path) -> Result<Self, RulesetError> {
        if !path.exists() {
            return Err(RulesetError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let file: RulesetFile =
            serde_yaml::from_str(&contents).map_err(|source| RulesetError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_file(file)
    }

    fn from_file(file: RulesetFile) -> Result<Self, RulesetError> {
        let owner = file.owner.unwrap_or_else(|| DEFAULT_OWNER.to_string());
        let targets = file
            .targets
            .iter()
            .map(|id| TargetRepo::parse(id, &owner))
            .collect::<Result<Vec<_>, _>>()?;
        let sync_patterns = match file.sync_patterns {
            Some(patterns) => patterns.into_iter().map(SyncPattern::from).collect(),
            None => SYNC_PATTERNS.iter().map(|p| SyncPattern::from(*p)).collect(),
        };
        let exclusions = file
            .exclusions
            .unwrap_or_else(|| EXCLUDE_PATTERNS.iter().map(|p| p.to_string()).collect());
        let commit_message = file
            .commit_message
            .unwrap_or_else(|| COMMIT_MESSAGE.to_string());

        Self::new(owner, targets, sync_patterns, &exclusions, commit_message)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn targets(&self) -> &[TargetRepo] {
        &self.targets
    }

    pub fn sync_patterns(&self) -> &[SyncPattern] {
        &self.sync_patterns
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    /// Find a registered target by `name` or `owner/name`.
    pub fn lookup(&self, id: &str) -> Option<&TargetRepo> {
        self.targets.iter().find(|t| t.matches(id))
    }

    /// Split a selection into registered targets and unknown identifiers.
    /// A target selected more than once is synced once.
    pub fn resolve(&self, selection: &TargetSelection) -> Resolution {
        match selection {
            TargetSelection::All => Resolution {
                targets: self.targets.clone(),
                unknown: Vec::new(),
                order: self.targets.iter().cloned().map(Selected::Target).collect(),
            },
            TargetSelection::Named(ids) => {
                let mut seen = HashSet::new();
                let mut resolution = Resolution::default();
                for id in ids {
                    match self.lookup(id) {
                        Some(target) => {
                            if seen.insert(target.identifier()) {
                                resolution.targets.push(target.clone());
                                resolution.order.push(Selected::Target(target.clone()));
                            }
                        }
                        None => {
                            resolution.unknown.push(id.clone());
                            resolution.order.push(Selected::Unknown(id.clone()));
                        }
                    }
                }
                resolution
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_complete() {
        let rules = Ruleset::builtin().unwrap();
        assert_eq!(rules.targets().len(), 19);
        assert_eq!(rules.sync_patterns().len(), 8);
        assert_eq!(rules.exclusions().patterns().len(), 3);
        assert!(rules.targets().iter().all(|t| t.owner == "jdfalk"));
        assert!(rules.commit_message().starts_with("chore(sync):"));
    }

    #[test]
    fn builtin_patterns_are_valid() {
        for pattern in Ruleset::builtin().unwrap().sync_patterns() {
            pattern.validate().expect("built-in pattern");
        }
    }

    #[test]
    fn resolve_all_keeps_registry_order() {
        let rules = Ruleset::builtin().unwrap();
        let resolution = rules.resolve(&TargetSelection::All);
        assert_eq!(resolution.targets, rules.targets());
        assert!(resolution.unknown.is_empty());
    }

    #[test]
    fn resolve_named_splits_unknown() {
        let rules = Ruleset::builtin().unwrap();
        let selection = TargetSelection::parse("release-go-action,unknown-repo");
        let resolution = rules.resolve(&selection);
        assert_eq!(resolution.targets.len(), 1);
        assert_eq!(resolution.targets[0].name, "release-go-action");
        assert_eq!(resolution.unknown, vec!["unknown-repo".to_string()]);
    }

    #[test]
    fn resolve_deduplicates_bare_and_qualified_ids() {
        let rules = Ruleset::builtin().unwrap();
        let selection = TargetSelection::parse("release-go-action,jdfalk/release-go-action");
        assert_eq!(rules.resolve(&selection).targets.len(), 1);
    }

    #[test]
    fn resolve_keeps_selection_order_across_unknown_ids() {
        let rules = Ruleset::builtin().unwrap();
        let selection = TargetSelection::parse("ghost-a,release-go-action,ghost-b");
        assert_eq!(
            rules.resolve(&selection).order,
            vec![
                Selected::Unknown("ghost-a".into()),
                Selected::Target(TargetRepo::new("jdfalk", "release-go-action")),
                Selected::Unknown("ghost-b".into()),
            ]
        );
    }

    #[test]
    fn new_rejects_escaping_pattern() {
        let err = Ruleset::new(
            "acme",
            vec![],
            vec![SyncPattern::from("../secrets")],
            &[],
            "msg",
        )
        .unwrap_err();
        assert!(matches!(err, RulesetError::InvalidPattern { .. }));
    }
}
