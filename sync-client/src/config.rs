//! Per-peer sync configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sync_core::{safe_relative_path, EnvelopeParseError, InboundPolicy, PathClassifier};
use sync_types::PeerId;

/// Ignore file read from the working-copy root when none is configured.
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// Configuration shared by [`PatchBroadcaster`](crate::PatchBroadcaster) and
/// [`SyncEventHandler`](crate::SyncEventHandler).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Project this peer tracks.
    pub project: String,
    /// Identity attached to published envelopes.
    pub local_author: PeerId,
    /// Recipient of conflict and success notifications.
    pub admin: PeerId,
    /// Root of the local working copy; envelope paths resolve against it.
    pub working_copy: PathBuf,
    /// Ignore file, relative to `working_copy`.
    pub ignore_file: String,
    /// Upper bound for preparing one inbound apply; `None` waits
    /// indefinitely. The write itself is never bounded.
    pub apply_timeout: Option<Duration>,
}

impl SyncConfig {
    /// Create a configuration with the default ignore file and no apply
    /// timeout.
    pub fn new(
        project: impl Into<String>,
        local_author: PeerId,
        admin: PeerId,
        working_copy: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project: project.into(),
            local_author,
            admin,
            working_copy: working_copy.into(),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            apply_timeout: None,
        }
    }

    /// Set the ignore file (relative to the working copy).
    pub fn with_ignore_file(mut self, ignore_file: &str) -> Self {
        self.ignore_file = ignore_file.to_string();
        self
    }

    /// Bound the read-and-compute step of each inbound apply by `timeout`.
    pub fn with_apply_timeout(mut self, timeout: Duration) -> Self {
        self.apply_timeout = Some(timeout);
        self
    }

    /// Absolute location of the ignore file.
    pub fn ignore_path(&self) -> PathBuf {
        self.working_copy.join(&self.ignore_file)
    }

    /// Resolve a project-relative path inside the working copy.
    ///
    /// Paths that could escape the working copy are rejected.
    pub fn local_path_for(&self, relative: &str) -> Result<PathBuf, EnvelopeParseError> {
        let relative = safe_relative_path(relative)?;
        Ok(self.working_copy.join(Path::new(&relative)))
    }

    /// Build the inbound policy for this configuration.
    pub fn policy(&self, classifier: PathClassifier) -> InboundPolicy {
        InboundPolicy {
            project: self.project.clone(),
            local_author: self.local_author.clone(),
            admin: self.admin.clone(),
            classifier,
        }
    }
}
