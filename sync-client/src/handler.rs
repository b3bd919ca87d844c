//! Inbound patch handling.
//!
//! [`SyncEventHandler`] interprets the actions of the pure
//! [`InboundMachine`]: it applies admitted envelopes through the
//! [`PatchService`] under the per-path lock, and sends the resulting
//! notification to the admin over the [`Transport`].
//!
//! Items are processed strictly in arrival order. A malformed item, a
//! self-echo or a failed apply never stops the rest of the batch.

use std::collections::VecDeque;

use sync_core::{
    ApplyOutcome, BatchReport, DropReason, InboundAction, InboundEvent, InboundMachine,
    PathClassifier, Verdict,
};
use sync_types::PatchEnvelope;

use crate::config::SyncConfig;
use crate::error::ClientError;
use crate::locks::PathLocks;
use crate::patch::PatchService;
use crate::rules::load_classifier;
use crate::transport::{Transport, TransportError};

/// Applies patches received from peers and reports the outcome.
///
/// Generic over the transport and patch service so tests can run against
/// [`MockTransport`](crate::MockTransport) and a scripted patcher.
pub struct SyncEventHandler<T: Transport, P: PatchService> {
    config: SyncConfig,
    transport: T,
    patcher: P,
    locks: PathLocks,
    machine: InboundMachine,
}

impl<T: Transport, P: PatchService> SyncEventHandler<T, P> {
    /// Create a handler with its own lock table.
    pub fn new(config: SyncConfig, transport: T, patcher: P, classifier: PathClassifier) -> Self {
        let machine = InboundMachine::new(config.policy(classifier));
        Self {
            config,
            transport,
            patcher,
            locks: PathLocks::new(),
            machine,
        }
    }

    /// Share a lock table (normally the broadcaster's).
    pub fn with_locks(mut self, locks: PathLocks) -> Self {
        self.locks = locks;
        self
    }

    /// The lock table guarding target files.
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

    /// Replace the classifier used to admit inbound paths.
    pub fn set_classifier(&mut self, classifier: PathClassifier) {
        self.machine = InboundMachine::new(self.config.policy(classifier));
    }

    /// Re-read the configured ignore file.
    pub async fn reload_rules(&mut self) -> Result<(), ClientError> {
        let classifier = load_classifier(&self.config.ignore_path()).await?;
        self.set_classifier(classifier);
        Ok(())
    }

    /// Process one batch of raw items and return what happened to each.
    ///
    /// A batch whose processing was cut short (its future dropped mid-apply)
    /// is abandoned when the next batch arrives.
    pub async fn handle_batch(&mut self, items: Vec<Vec<u8>>) -> BatchReport {
        if !self.machine.is_idle() {
            tracing::warn!("Previous batch was interrupted; discarding its remaining items");
            self.machine.reset();
        }

        let mut pending: VecDeque<InboundAction> = self
            .machine
            .on_event(InboundEvent::BatchReceived { items })
            .into();

        while let Some(action) = pending.pop_front() {
            match action {
                InboundAction::Apply { index, envelope } => {
                    let event = match self.apply(&envelope).await {
                        Ok(outcome) => InboundEvent::Applied { outcome },
                        Err(e) => {
                            tracing::debug!("Apply of item {} failed: {}", index, e);
                            InboundEvent::ApplyFailed {
                                error: e.to_string(),
                            }
                        }
                    };
                    pending.extend(self.machine.on_event(event));
                }

                InboundAction::Notify {
                    index,
                    notification,
                } => {
                    match notification.verdict {
                        Verdict::Conflict => tracing::info!(
                            project = %notification.project,
                            path = %notification.path,
                            author = %notification.author,
                            failed_hunks = notification.failed_hunks,
                            "Conflict on inbound patch"
                        ),
                        Verdict::Clean => tracing::debug!(
                            project = %notification.project,
                            path = %notification.path,
                            author = %notification.author,
                            "Inbound patch applied cleanly"
                        ),
                    }

                    let body = notification.message();
                    let event = match self
                        .transport
                        .send_message(&notification.recipient, &body)
                        .await
                    {
                        Ok(()) => InboundEvent::Notified,
                        Err(e) => {
                            tracing::warn!(
                                "Failed to notify {} about item {}: {}",
                                notification.recipient,
                                index,
                                e
                            );
                            InboundEvent::NotifyFailed {
                                error: e.to_string(),
                            }
                        }
                    };
                    pending.extend(self.machine.on_event(event));
                }

                InboundAction::Drop { index, reason } => match reason {
                    DropReason::SelfEcho => {
                        tracing::debug!("Skipping own patch (item {})", index)
                    }
                    DropReason::Malformed(e) => {
                        tracing::warn!("Dropping item {}: {}", index, e)
                    }
                    DropReason::ApplyFailed(e) => {
                        tracing::warn!("Patch service failed on item {}: {}", index, e)
                    }
                },

                InboundAction::Finish { report } => {
                    self.locks.prune();
                    tracing::info!(
                        received = report.received,
                        clean = report.clean,
                        conflict = report.conflict,
                        dropped = report.dropped(),
                        "Batch processed"
                    );
                    return report;
                }
            }
        }

        tracing::warn!("Batch ended without a report; resetting inbound state");
        self.machine.reset();
        BatchReport::default()
    }

    /// Receive and handle batches until the transport closes.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        loop {
            match self.transport.recv_batch().await {
                Ok(items) => {
                    self.handle_batch(items).await;
                }
                Err(TransportError::ConnectionClosed) => {
                    tracing::info!("Transport closed, stopping inbound handler");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn apply(&self, envelope: &PatchEnvelope) -> Result<ApplyOutcome, ClientError> {
        let target = self.config.local_path_for(&envelope.path)?;
        let _guard = self.locks.lock(&envelope.path).await;

        let prepare = self.patcher.prepare(&envelope.diff, &target);
        let prepared = match self.config.apply_timeout {
            Some(limit) => tokio::time::timeout(limit, prepare)
                .await
                .map_err(|_| ClientError::Timeout(limit))??,
            None => prepare.await?,
        };
        // The write is never cut short by the apply timeout.
        Ok(self.patcher.commit(prepared).await?)
    }
}
