//! Unified diff rendering.

use similar::TextDiff;

/// Lines of unchanged context around each hunk.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Render a line-based unified diff from `old` to `new`.
///
/// No `---`/`+++` file header is emitted: the envelope already names the
/// file. Identical inputs produce an empty diff.
pub fn make_diff(old: &str, new: &str, context: usize) -> String {
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(context)
        .to_string()
}
