//! Seam between the client and whatever produces and applies diffs.

use std::path::Path;

use async_trait::async_trait;
use sync_content::{PatchError, PreparedPatch, TextPatcher};
use sync_core::ApplyOutcome;

/// Diff/patch service used by the broadcaster and the handler.
///
/// `diff` must be deterministic for identical inputs. Applying is split in
/// two: `prepare` reads the target and computes the result, `commit` writes
/// it. The handler bounds only `prepare` with the apply timeout, so a write
/// that has started always finishes under the path lock.
///
/// Outcomes carry one status per hunk; a service that cannot apply the diff
/// at all returns an error instead.
#[async_trait]
pub trait PatchService: Send + Sync {
    /// Computed result waiting to be written.
    type Prepared: Send;

    /// Produce a diff from `old` to `new`. Identical inputs give `""`.
    fn diff(&self, old: &str, new: &str) -> String;

    /// Compute the result of applying `diff` to the file at `target`.
    ///
    /// Must not modify the file.
    async fn prepare(&self, diff: &str, target: &Path) -> Result<Self::Prepared, PatchError>;

    /// Write a prepared result and return its outcome.
    async fn commit(&self, prepared: Self::Prepared) -> Result<ApplyOutcome, PatchError>;

    /// Prepare and commit in one step.
    async fn apply(&self, diff: &str, target: &Path) -> Result<ApplyOutcome, PatchError> {
        let prepared = self.prepare(diff, target).await?;
        self.commit(prepared).await
    }
}

#[async_trait]
impl PatchService for TextPatcher {
    type Prepared = PreparedPatch;

    fn diff(&self, old: &str, new: &str) -> String {
        TextPatcher::diff(self, old, new)
    }

    async fn prepare(&self, diff: &str, target: &Path) -> Result<PreparedPatch, PatchError> {
        TextPatcher::prepare(self, diff, target).await
    }

    async fn commit(&self, prepared: PreparedPatch) -> Result<ApplyOutcome, PatchError> {
        prepared.commit().await
    }
}
