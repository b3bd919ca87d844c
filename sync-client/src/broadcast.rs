//! Outbound side: turning local edits into published patches.

use sync_core::{safe_relative_path, PathClassifier};
use sync_types::PatchEnvelope;

use crate::config::SyncConfig;
use crate::error::ClientError;
use crate::locks::PathLocks;
use crate::patch::PatchService;
use crate::transport::Transport;

/// Result of offering a local edit for publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A patch was handed to the transport.
    Published,
    /// The path is excluded from sync.
    Ignored,
    /// Old and new content are identical; nothing to send.
    Unchanged,
}

/// Result of [`PatchBroadcaster::publish_file_change`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// What happened to the edit.
    pub outcome: PublishOutcome,
    /// File content the diff was taken against; the caller's next baseline.
    pub content: String,
}

/// Publishes local edits to the project's peers.
///
/// Publishing is fire-and-forget: no acknowledgement is awaited and nothing
/// is retried. A transport error is returned to the caller.
pub struct PatchBroadcaster<T: Transport, P: PatchService> {
    config: SyncConfig,
    transport: T,
    patcher: P,
    locks: PathLocks,
    classifier: PathClassifier,
}

impl<T: Transport, P: PatchService> PatchBroadcaster<T, P> {
    /// Create a broadcaster with its own lock table.
    pub fn new(config: SyncConfig, transport: T, patcher: P, classifier: PathClassifier) -> Self {
        Self {
            config,
            transport,
            patcher,
            locks: PathLocks::new(),
            classifier,
        }
    }

    /// Share a lock table (normally with the inbound handler).
    pub fn with_locks(mut self, locks: PathLocks) -> Self {
        self.locks = locks;
        self
    }

    /// The lock table guarding local files.
    pub fn locks(&self) -> &PathLocks {
        &self.locks
    }

    /// Get the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Get a reference to the transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The classifier deciding which paths are published.
    pub fn classifier(&self) -> &PathClassifier {
        &self.classifier
    }

    /// Replace the classifier (after the ignore file changed).
    pub fn set_classifier(&mut self, classifier: PathClassifier) {
        self.classifier = classifier;
    }

    /// Diff `old` against `new` with the configured patch service.
    pub fn make_patch(&self, old: &str, new: &str) -> String {
        let diff = self.patcher.diff(old, new);
        tracing::debug!(
            old_len = old.len(),
            new_len = new.len(),
            diff_len = diff.len(),
            "Made patch"
        );
        diff
    }

    /// Publish `diff` for `path` under this peer's identity.
    pub async fn broadcast(&self, path: &str, diff: &str) -> Result<(), ClientError> {
        let path = safe_relative_path(path)?;
        let envelope = PatchEnvelope::new(
            self.config.project.clone(),
            path,
            diff,
            self.config.local_author.clone(),
        );
        let bytes = envelope.to_bytes()?;
        self.transport.publish(&bytes).await?;

        tracing::debug!(
            project = %envelope.project,
            path = %envelope.path,
            bytes = bytes.len(),
            "Broadcast patch"
        );
        Ok(())
    }

    /// Diff and publish an edit of `path` from `old` to `new`.
    ///
    /// The path lock is held across diff and broadcast.
    pub async fn publish_edit(
        &self,
        path: &str,
        old: &str,
        new: &str,
    ) -> Result<PublishOutcome, ClientError> {
        let path = safe_relative_path(path)?;
        if !self.classifier.should_sync(&path) {
            tracing::debug!(path = %path, "Not publishing excluded path");
            return Ok(PublishOutcome::Ignored);
        }

        let _guard = self.locks.lock(&path).await;
        self.publish_locked(&path, old, new).await
    }

    /// Read `path` from the working copy and publish its change from
    /// `previous`.
    ///
    /// A missing file is read as empty. The content that was diffed is
    /// returned so the caller can keep it as the next baseline.
    pub async fn publish_file_change(
        &self,
        path: &str,
        previous: &str,
    ) -> Result<FileChange, ClientError> {
        let path = safe_relative_path(path)?;
        if !self.classifier.should_sync(&path) {
            tracing::debug!(path = %path, "Not publishing excluded path");
            return Ok(FileChange {
                outcome: PublishOutcome::Ignored,
                content: previous.to_string(),
            });
        }

        let local = self.config.local_path_for(&path)?;
        let _guard = self.locks.lock(&path).await;
        let content = match tokio::fs::read_to_string(&local).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(ClientError::io(local, e)),
        };

        let outcome = self.publish_locked(&path, previous, &content).await?;
        Ok(FileChange { outcome, content })
    }

    async fn publish_locked(
        &self,
        path: &str,
        old: &str,
        new: &str,
    ) -> Result<PublishOutcome, ClientError> {
        let diff = self.make_patch(old, new);
        if diff.is_empty() {
            return Ok(PublishOutcome::Unchanged);
        }
        self.broadcast(path, &diff).await?;
        Ok(PublishOutcome::Published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::tests::FakePatcher;
    use crate::handler::SyncEventHandler;
    use crate::transport::{MockTransport, TransportError};
    use std::time::Duration;
    use sync_content::TextPatcher;
    use sync_core::parse_item;
    use sync_types::PeerId;
    use tempfile::tempdir;

    fn peer(name: &str) -> PeerId {
        PeerId::new(name).unwrap()
    }

    fn broadcaster(transport: &MockTransport) -> PatchBroadcaster<MockTransport, FakePatcher> {
        let config = SyncConfig::new("baboon", peer("me"), peer("admin"), "/work/baboon");
        let (classifier, _) = PathClassifier::from_ignore_text("*.log\n");
        PatchBroadcaster::new(config, transport.clone(), FakePatcher::default(), classifier)
    }

    // ===========================================
    // broadcast / publish_edit
    // ===========================================

    #[tokio::test]
    async fn broadcast_publishes_envelope_with_own_author() {
        let transport = MockTransport::new();
        let broadcaster = broadcaster(&transport);

        broadcaster.broadcast("./src//lib.rs", "the diff").await.unwrap();

        let bytes = transport.last_published().unwrap();
        let envelope = parse_item(&bytes).into_result().unwrap();
        assert_eq!(envelope.project, "baboon");
        assert_eq!(envelope.path, "src/lib.rs");
        assert_eq!(envelope.diff, "the diff");
        assert_eq!(envelope.author, peer("me"));
    }

    #[tokio::test]
    async fn broadcast_rejects_unsafe_path() {
        let transport = MockTransport::new();
        let broadcaster = broadcaster(&transport);

        let result = broadcaster.broadcast("../outside", "d").await;
        assert!(matches!(result, Err(ClientError::InvalidPath(_))));
        assert!(transport.published().is_empty());
    }

    #[tokio::test]
    async fn broadcast_surfaces_transport_error() {
        let transport = MockTransport::new();
        transport.fail_next_publish("no peers");
        let broadcaster = broadcaster(&transport);

        let result = broadcaster.broadcast("a.txt", "d").await;
        assert!(matches!(
            result,
            Err(ClientError::Transport(TransportError::PublishFailed(_)))
        ));
    }

    #[tokio::test]
    async fn publish_edit_outcomes() {
        let transport = MockTransport::new();
        let broadcaster = broadcaster(&transport);

        assert_eq!(
            broadcaster.publish_edit("a.txt", "x", "y").await.unwrap(),
            PublishOutcome::Published
        );
        assert_eq!(
            broadcaster.publish_edit("a.txt", "same", "same").await.unwrap(),
            PublishOutcome::Unchanged
        );
        assert_eq!(
            broadcaster.publish_edit("debug.log", "x", "y").await.unwrap(),
            PublishOutcome::Ignored
        );
        assert_eq!(
            broadcaster.publish_edit(".git/index", "x", "y").await.unwrap(),
            PublishOutcome::Ignored
        );
        assert_eq!(transport.published().len(), 1);
    }

    #[tokio::test]
    async fn publish_edit_waits_for_path_lock() {
        let transport = MockTransport::new();
        let broadcaster = broadcaster(&transport);
        let locks = broadcaster.locks().clone();

        let guard = locks.lock("a.txt").await;
        let task =
            tokio::spawn(async move { broadcaster.publish_edit("a.txt", "x", "y").await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(transport.published().is_empty());

        drop(guard);
        assert_eq!(task.await.unwrap().unwrap(), PublishOutcome::Published);
        assert_eq!(transport.published().len(), 1);
    }

    #[tokio::test]
    async fn publish_file_change_reads_working_copy() {
        let dir = tempdir().unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "new\n")
            .await
            .unwrap();

        let transport = MockTransport::new();
        let config = SyncConfig::new("baboon", peer("me"), peer("admin"), dir.path());
        let broadcaster = PatchBroadcaster::new(
            config,
            transport.clone(),
            TextPatcher::new(),
            PathClassifier::default(),
        );

        let change = broadcaster
            .publish_file_change("notes.txt", "old\n")
            .await
            .unwrap();
        assert_eq!(change.outcome, PublishOutcome::Published);
        assert_eq!(change.content, "new\n");

        let again = broadcaster
            .publish_file_change("notes.txt", &change.content)
            .await
            .unwrap();
        assert_eq!(again.outcome, PublishOutcome::Unchanged);
        assert_eq!(transport.published().len(), 1);
    }

    // ===========================================
    // Two peers over one transport
    // ===========================================

    #[tokio::test]
    async fn edit_propagates_between_peers() {
        let alice_dir = tempdir().unwrap();
        let bob_dir = tempdir().unwrap();
        let original = "fn main() {\n    println!(\"hi\");\n}\n";
        let edited = "fn main() {\n    println!(\"hello\");\n}\n";
        tokio::fs::write(bob_dir.path().join("main.rs"), original)
            .await
            .unwrap();

        let wire = MockTransport::new();
        let alice = PatchBroadcaster::new(
            SyncConfig::new("baboon", peer("alice"), peer("admin"), alice_dir.path()),
            wire.clone(),
            TextPatcher::new(),
            PathClassifier::default(),
        );
        let mut bob = SyncEventHandler::new(
            SyncConfig::new("baboon", peer("bob"), peer("admin"), bob_dir.path()),
            wire.clone(),
            TextPatcher::new(),
            PathClassifier::default(),
        );

        alice.publish_edit("main.rs", original, edited).await.unwrap();
        let report = bob.handle_batch(wire.published()).await;

        assert_eq!(report.clean, 1);
        let on_disk = tokio::fs::read_to_string(bob_dir.path().join("main.rs"))
            .await
            .unwrap();
        assert_eq!(on_disk, edited);
        assert_eq!(
            wire.messages()[0].1,
            "Patch applied cleanly to baboon:main.rs (from alice)"
        );
    }

    #[tokio::test]
    async fn diverged_peer_reports_conflict_and_keeps_file() {
        let bob_dir = tempdir().unwrap();
        let diverged = "completely\ndifferent\ncontent\n";
        tokio::fs::write(bob_dir.path().join("a.txt"), diverged)
            .await
            .unwrap();

        let wire = MockTransport::new();
        let alice = PatchBroadcaster::new(
            SyncConfig::new("baboon", peer("alice"), peer("admin"), "/unused"),
            wire.clone(),
            TextPatcher::new(),
            PathClassifier::default(),
        );
        let mut bob = SyncEventHandler::new(
            SyncConfig::new("baboon", peer("bob"), peer("admin"), bob_dir.path()),
            wire.clone(),
            TextPatcher::new(),
            PathClassifier::default(),
        );

        alice
            .publish_edit("a.txt", "one\ntwo\nthree\n", "one\n2\nthree\n")
            .await
            .unwrap();
        let report = bob.handle_batch(wire.published()).await;

        assert_eq!(report.conflict, 1);
        assert!(wire.messages()[0].1.starts_with("Conflict detected"));
        let on_disk = tokio::fs::read_to_string(bob_dir.path().join("a.txt"))
            .await
            .unwrap();
        assert_eq!(on_disk, diverged);
    }
}
