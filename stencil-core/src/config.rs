//! Run configuration: the `DRY_RUN` toggle and the `TARGET_REPOS` selection.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Only `"true"` (any case) enables dry-run; every other value is a live run.
pub fn parse_dry_run(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Which registered targets a run covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSelection {
    /// Every registered target, in registry order.
    #[default]
    All,
    /// An explicit subset, in the order given. Entries may be unknown.
    Named(Vec<String>),
}

impl TargetSelection {
    /// `"all"` selects everything; anything else is a comma-separated list
    /// whose entries are trimmed. Empty entries are dropped.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value == "all" {
            return Self::All;
        }
        Self::Named(
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }
}

impl FromStr for TargetSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for TargetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSelection::All => write!(f, "all"),
            TargetSelection::Named(names) => write!(f, "{}", names.join(",")),
        }
    }
}

/// Settings shared by every target in one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunConfig {
    pub dry_run: bool,
    pub selection: TargetSelection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case("True", true)]
    #[case(" true ", true)]
    #[case("false", false)]
    #[case("1", false)]
    #[case("yes", false)]
    #[case("", false)]
    fn dry_run_values(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_dry_run(raw), expected, "DRY_RUN={raw:?}");
    }

    #[test]
    fn all_selects_everything() {
        assert_eq!(TargetSelection::parse("all"), TargetSelection::All);
        assert_eq!(TargetSelection::parse(" all "), TargetSelection::All);
    }

    #[test]
    fn list_entries_are_trimmed() {
        assert_eq!(
            TargetSelection::parse("repoA, unknown-repo ,jdfalk/repoB"),
            TargetSelection::Named(vec![
                "repoA".to_string(),
                "unknown-repo".to_string(),
                "jdfalk/repoB".to_string(),
            ])
        );
    }

    #[test]
    fn empty_entries_are_dropped() {
        assert_eq!(
            TargetSelection::parse("repoA,,"),
            TargetSelection::Named(vec!["repoA".to_string()])
        );
    }

    #[test]
    fn default_config_is_live_run_over_all_targets() {
        let config = RunConfig::default();
        assert!(!config.dry_run);
        assert_eq!(config.selection, TargetSelection::All);
    }
}
