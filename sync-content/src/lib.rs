//! # sync-content
//!
//! Default diff and patch service for patchsync.
//!
//! Diffs are line-based unified diffs without a file header. Applying one
//! reports a status per hunk, which is what the inbound handler uses to
//! tell a clean apply from a conflict.
//!
//! ```text
//! old text ─┐
//!           ├─ similar::TextDiff ─▶ "@@ -a,b +c,d @@ …" ─▶ transport
//! new text ─┘
//!
//! "@@ …" ─▶ parse_hunks ─▶ locate each hunk (recorded line + drift, then nearest)
//!                          └─▶ ApplyOutcome { result_content, hunk_statuses }
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sync_content::TextPatcher;
//!
//! let patcher = TextPatcher::new();
//! let diff = patcher.diff("a\nb\n", "a\nB\n");
//! let outcome = patcher.apply(&diff, "a\nb\n")?;
//! assert_eq!(outcome.result_content, "a\nB\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod apply;
mod diff;
mod error;

pub use apply::{apply_diff, apply_hunks, parse_hunks, Hunk};
pub use diff::{make_diff, DEFAULT_CONTEXT_LINES};
pub use error::PatchError;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use sync_core::ApplyOutcome;

/// Line-based diff/patch service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPatcher {
    context: usize,
}

impl Default for TextPatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TextPatcher {
    /// Create a patcher with the default context radius.
    pub fn new() -> Self {
        Self {
            context: DEFAULT_CONTEXT_LINES,
        }
    }

    /// Set the number of context lines rendered around each hunk.
    pub fn with_context(mut self, context: usize) -> Self {
        self.context = context;
        self
    }

    /// Diff `old` against `new`.
    pub fn diff(&self, old: &str, new: &str) -> String {
        make_diff(old, new, self.context)
    }

    /// Apply `diff` to in-memory text.
    pub fn apply(&self, diff: &str, original: &str) -> Result<ApplyOutcome, PatchError> {
        apply_diff(diff, original)
    }

    /// Apply `diff` to the file at `target`.
    ///
    /// A missing target is treated as empty. The result is written back only
    /// when every hunk applied; on conflict the file is left untouched and
    /// the outcome still carries the partially patched content.
    pub async fn apply_to_file(
        &self,
        diff: &str,
        target: &Path,
    ) -> Result<ApplyOutcome, PatchError> {
        self.prepare(diff, target).await?.commit().await
    }

    /// Read `target` and compute the result of applying `diff`, without
    /// writing anything.
    pub async fn prepare(&self, diff: &str, target: &Path) -> Result<PreparedPatch, PatchError> {
        let original = match tokio::fs::read_to_string(target).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(PatchError::Io {
                    path: target.to_path_buf(),
                    source,
                })
            }
        };

        let outcome = self.apply(diff, &original)?;
        Ok(PreparedPatch {
            target: target.to_path_buf(),
            original,
            outcome,
        })
    }
}

/// A computed patch result that has not been written yet.
///
/// Produced by [`TextPatcher::prepare`]; [`PreparedPatch::commit`] performs
/// the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPatch {
    target: PathBuf,
    original: String,
    outcome: ApplyOutcome,
}

impl PreparedPatch {
    /// File the patch was computed against.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Outcome of the apply.
    pub fn outcome(&self) -> &ApplyOutcome {
        &self.outcome
    }

    /// Whether committing changes the file: every hunk applied and the
    /// content differs.
    pub fn needs_write(&self) -> bool {
        self.outcome.hunk_statuses.iter().all(|applied| *applied)
            && self.outcome.result_content != self.original
    }

    /// Write the result to disk when [`needs_write`](Self::needs_write),
    /// creating missing parent directories.
    pub async fn commit(self) -> Result<ApplyOutcome, PatchError> {
        if self.needs_write() {
            let io_err = |source: std::io::Error| PatchError::Io {
                path: self.target.clone(),
                source,
            };
            if let Some(parent) = self.target.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
            tokio::fs::write(&self.target, &self.outcome.result_content)
                .await
                .map_err(io_err)?;
        }
        Ok(self.outcome)
    }
}
