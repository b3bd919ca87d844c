//! Apply outcomes, their classification, and admin notifications.

use sync_types::PeerId;

/// Result of applying one patch through the patch service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Content of the target after applying every hunk that fit.
    pub result_content: String,
    /// Per-hunk apply status, in patch order.
    pub hunk_statuses: Vec<bool>,
}

impl ApplyOutcome {
    /// Create a new outcome.
    pub fn new(result_content: impl Into<String>, hunk_statuses: Vec<bool>) -> Self {
        Self {
            result_content: result_content.into(),
            hunk_statuses,
        }
    }

    /// Classify the outcome: any failed hunk is a conflict.
    pub fn verdict(&self) -> Verdict {
        if self.hunk_statuses.iter().any(|applied| !applied) {
            Verdict::Conflict
        } else {
            Verdict::Clean
        }
    }

    /// Number of hunks that did not apply.
    pub fn failed_hunks(&self) -> usize {
        self.hunk_statuses.iter().filter(|applied| !**applied).count()
    }
}

/// Classification of an applied patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Every hunk applied.
    Clean,
    /// At least one hunk failed to apply.
    Conflict,
}

/// A message for the administrative recipient about one applied patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Who receives the message.
    pub recipient: PeerId,
    /// Conflict or clean.
    pub verdict: Verdict,
    /// Project of the patched file.
    pub project: String,
    /// Relative path of the patched file.
    pub path: String,
    /// Author of the patch.
    pub author: PeerId,
    /// How many hunks failed (0 when clean).
    pub failed_hunks: usize,
}

impl Notification {
    /// Plain-text body sent to the recipient.
    ///
    /// Conflict and clean messages start differently so a reader (or a
    /// filter) can tell them apart.
    pub fn message(&self) -> String {
        match self.verdict {
            Verdict::Conflict => format!(
                "Conflict detected in {}:{} ({} hunk(s) rejected, patch from {})",
                self.project, self.path, self.failed_hunks, self.author
            ),
            Verdict::Clean => format!(
                "Patch applied cleanly to {}:{} (from {})",
                self.project, self.path, self.author
            ),
        }
    }
}
