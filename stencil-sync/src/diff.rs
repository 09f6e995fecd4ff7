//! Unified diffs for dry-run reporting.

use std::path::Path;

use similar::TextDiff;

/// Render a unified diff from the target's current bytes to the template's.
///
/// A missing target file diffs against empty content. Returns `None` when
/// either side is not valid UTF-8.
pub fn unified_diff(relative: &Path, current: Option<&[u8]>, template: &[u8]) -> Option<String> {
    let old = match current {
        Some(bytes) => std::str::from_utf8(bytes).ok()?,
        None => "",
    };
    let new = std::str::from_utf8(template).ok()?;

    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    Some(
        TextDiff::from_lines(old, new)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string(),
    )
}
