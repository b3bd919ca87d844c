//! Client errors.

use std::path::PathBuf;

use sync_content::PatchError;
use sync_core::EnvelopeParseError;
use sync_types::SyncError;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by the broadcaster and the handler.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Patch service error.
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    /// Envelope encoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] SyncError),

    /// A path could not be mapped into the working copy.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] EnvelopeParseError),

    /// Filesystem error.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The patch service did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ClientError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
