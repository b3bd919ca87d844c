//! Error types for sync-content.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while diffing or patching.
#[derive(Error, Debug)]
pub enum PatchError {
    /// The diff text is not a well-formed unified diff.
    #[error("malformed diff at line {line}: {reason}")]
    Malformed {
        /// 1-based line number in the diff text.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Reading or writing the target failed.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// File being patched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        PatchError::Malformed {
            line,
            reason: reason.into(),
        }
    }
}
