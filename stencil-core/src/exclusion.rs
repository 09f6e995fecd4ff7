//! Exclusion glob matching.
//!
//! Patterns match right-anchored against the path of a file relative to its
//! sync-pattern root: `README.md` excludes both `README.md` and
//! `foo/README.md`, while `*` never crosses a `/`. A pattern with a trailing
//! `/` also excludes every file beneath a directory of that name. A leading
//! `/` anchors the pattern at the sync-pattern root.

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::RulesetError;

/// Compiled exclusion patterns.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<String>,
    set: GlobSet,
    /// Index into `patterns` for every glob compiled into `set`.
    owners: Vec<usize>,
}

impl ExclusionSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, RulesetError> {
        let mut builder = GlobSetBuilder::new();
        let mut owners = Vec::new();
        let mut originals = Vec::with_capacity(patterns.len());

        for (idx, raw) in patterns.iter().enumerate() {
            let raw = raw.as_ref();
            originals.push(raw.to_string());
            for expanded in expand(raw) {
                let glob = GlobBuilder::new(&expanded)
                    .literal_separator(true)
                    .build()
                    .map_err(|source| RulesetError::InvalidGlob {
                        pattern: raw.to_string(),
                        source,
                    })?;
                builder.add(glob);
                owners.push(idx);
            }
        }

        let set = builder.build().map_err(|source| RulesetError::InvalidGlob {
            pattern: originals.join(", "),
            source,
        })?;

        Ok(Self {
            patterns: originals,
            set,
            owners,
        })
    }

    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
            owners: Vec::new(),
        }
    }

    pub fn is_match(&self, relative: &Path) -> bool {
        self.set.is_match(relative)
    }

    /// The first declared pattern excluding `relative`, if any.
    pub fn matching(&self, relative: &Path) -> Option<&str> {
        self.set
            .matches(relative)
            .into_iter()
            .map(|glob_idx| self.owners[glob_idx])
            .min()
            .map(|idx| self.patterns[idx].as_str())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn expand(raw: &str) -> Vec<String> {
    let is_dir = raw.ends_with('/');
    let anchored = raw.starts_with('/');
    let body = raw.trim_start_matches('/').trim_end_matches('/');
    let base = if anchored {
        body.to_string()
    } else {
        format!("**/{body}")
    };

    let mut globs = vec![base.clone()];
    if is_dir {
        globs.push(format!("{base}/**"));
    }
    globs
}
