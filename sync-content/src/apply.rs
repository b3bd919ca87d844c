//! Hunk parsing and application.
//!
//! Each hunk is applied on its own: its old lines (context plus removals)
//! are looked up at the position recorded in the header, shifted by the
//! drift of hunks applied before it, then at the nearest position anywhere
//! in the text. A hunk whose old lines cannot be found is left out and
//! reported as `false`.

use sync_core::ApplyOutcome;

use crate::PatchError;

/// One hunk of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 0-based line index in the old text where the hunk starts.
    pub old_start: usize,
    /// Lines the hunk expects to find (context and removals), with endings.
    pub old_lines: Vec<String>,
    /// Lines the hunk leaves behind (context and additions), with endings.
    pub new_lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Context,
    Removed,
    Added,
}

/// Parse the hunks of a unified diff.
///
/// `---`/`+++`, `diff` and `index` header lines are skipped. An empty diff
/// has no hunks.
pub fn parse_hunks(diff: &str) -> Result<Vec<Hunk>, PatchError> {
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut old_remaining = 0usize;
    let mut new_remaining = 0usize;
    let mut last_kind: Option<LineKind> = None;

    for (idx, raw) in diff.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let in_hunk = old_remaining > 0 || new_remaining > 0;

        if raw.starts_with('\\') {
            let hunk = hunks
                .last_mut()
                .ok_or_else(|| PatchError::malformed(line_no, "marker outside a hunk"))?;
            strip_newline(hunk, last_kind, line_no)?;
            continue;
        }

        if !in_hunk {
            if raw.starts_with("@@") {
                let (old_start, old_len, new_len) = parse_header(raw, line_no)?;
                hunks.push(Hunk {
                    old_start,
                    old_lines: Vec::new(),
                    new_lines: Vec::new(),
                });
                old_remaining = old_len;
                new_remaining = new_len;
                last_kind = None;
                continue;
            }
            if is_file_header(raw) || raw.trim().is_empty() {
                continue;
            }
            return Err(PatchError::malformed(line_no, "line outside a hunk"));
        }

        let hunk = hunks
            .last_mut()
            .ok_or_else(|| PatchError::malformed(line_no, "body line before hunk header"))?;
        let (tag, content) = match raw.char_indices().nth(1) {
            Some((split, _)) => (&raw[..split], &raw[split..]),
            // Bare newline: a context line whose leading space was stripped.
            None if raw == "\n" => (" ", "\n"),
            None => (raw, ""),
        };

        let kind = match tag {
            " " => LineKind::Context,
            "-" => LineKind::Removed,
            "+" => LineKind::Added,
            _ => return Err(PatchError::malformed(line_no, "unknown line prefix")),
        };
        if matches!(kind, LineKind::Context | LineKind::Removed) {
            if old_remaining == 0 {
                return Err(PatchError::malformed(line_no, "hunk longer than its header"));
            }
            old_remaining -= 1;
            hunk.old_lines.push(content.to_string());
        }
        if matches!(kind, LineKind::Context | LineKind::Added) {
            if new_remaining == 0 {
                return Err(PatchError::malformed(line_no, "hunk longer than its header"));
            }
            new_remaining -= 1;
            hunk.new_lines.push(content.to_string());
        }
        last_kind = Some(kind);
    }

    if old_remaining > 0 || new_remaining > 0 {
        return Err(PatchError::malformed(
            diff.split_inclusive('\n').count(),
            "truncated hunk",
        ));
    }
    Ok(hunks)
}

/// Apply parsed hunks to `original`, each independently.
pub fn apply_hunks(original: &str, hunks: &[Hunk]) -> ApplyOutcome {
    let mut lines: Vec<String> = original.split_inclusive('\n').map(String::from).collect();
    let mut statuses = Vec::with_capacity(hunks.len());
    let mut drift: isize = 0;

    for hunk in hunks {
        let expected = (hunk.old_start as isize + drift).max(0) as usize;
        match locate(&lines, &hunk.old_lines, expected) {
            Some(pos) => {
                lines.splice(pos..pos + hunk.old_lines.len(), hunk.new_lines.iter().cloned());
                drift = pos as isize - hunk.old_start as isize + hunk.new_lines.len() as isize
                    - hunk.old_lines.len() as isize;
                statuses.push(true);
            }
            None => statuses.push(false),
        }
    }

    ApplyOutcome::new(lines.concat(), statuses)
}

/// Parse `diff` and apply it to `original`.
pub fn apply_diff(diff: &str, original: &str) -> Result<ApplyOutcome, PatchError> {
    let hunks = parse_hunks(diff)?;
    Ok(apply_hunks(original, &hunks))
}

/// Nearest position to `expected` where `needle` occurs in `lines`.
fn locate(lines: &[String], needle: &[String], expected: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(expected.min(lines.len()));
    }
    if needle.len() > lines.len() {
        return None;
    }

    let last = lines.len() - needle.len();
    let expected = expected.min(last);
    let fits = |pos: usize| lines[pos..pos + needle.len()] == *needle;

    for distance in 0..=last {
        let before = expected.checked_sub(distance);
        let after = expected + distance;
        if before.is_none() && after > last {
            break;
        }
        if let Some(pos) = before {
            if fits(pos) {
                return Some(pos);
            }
        }
        if distance > 0 && after <= last && fits(after) {
            return Some(after);
        }
    }
    None
}

/// `@@ -a[,b] +c[,d] @@` → (0-based old start, old len, new len).
fn parse_header(raw: &str, line_no: usize) -> Result<(usize, usize, usize), PatchError> {
    let bad = || PatchError::malformed(line_no, "bad hunk header");

    let body = raw
        .strip_prefix("@@ ")
        .and_then(|rest| rest.split(" @@").next())
        .ok_or_else(bad)?;
    let mut ranges = body.split_whitespace();
    let old = ranges.next().and_then(|r| r.strip_prefix('-')).ok_or_else(bad)?;
    let new = ranges.next().and_then(|r| r.strip_prefix('+')).ok_or_else(bad)?;

    let (old_start, old_len) = parse_range(old).ok_or_else(bad)?;
    let (_, new_len) = parse_range(new).ok_or_else(bad)?;

    // An empty old range names the line *after which* the hunk goes.
    let index = if old_len == 0 {
        old_start
    } else {
        old_start.checked_sub(1).ok_or_else(bad)?
    };
    Ok((index, old_len, new_len))
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

fn is_file_header(raw: &str) -> bool {
    raw.starts_with("--- ")
        || raw.starts_with("+++ ")
        || raw.starts_with("diff ")
        || raw.starts_with("index ")
}

fn strip_newline(hunk: &mut Hunk, kind: Option<LineKind>, line_no: usize) -> Result<(), PatchError> {
    let (old_side, new_side) = match kind {
        Some(LineKind::Context) => (true, true),
        Some(LineKind::Removed) => (true, false),
        Some(LineKind::Added) => (false, true),
        None => return Err(PatchError::malformed(line_no, "marker before any line")),
    };
    if old_side {
        pop_newline(&mut hunk.old_lines);
    }
    if new_side {
        pop_newline(&mut hunk.new_lines);
    }
    Ok(())
}

fn pop_newline(lines: &mut [String]) {
    if let Some(last) = lines.last_mut() {
        if last.ends_with('\n') {
            last.pop();
        }
    }
}
