pub mod sync;
pub mod targets;

use std::path::Path;

use anyhow::{Context, Result};

use stencil_core::Ruleset;

/// The ruleset file when one is given, else the built-in tables.
pub(crate) fn load_ruleset(path: Option<&Path>) -> Result<Ruleset> {
    match path {
        Some(path) => Ruleset::load_at(path)
            .with_context(|| format!("failed to load ruleset from {}", path.display())),
        None => Ruleset::builtin().context("built-in ruleset is invalid"),
    }
}
