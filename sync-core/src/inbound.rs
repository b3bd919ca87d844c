//! Inbound batch state machine for patchsync.
//!
//! This module provides a pure, side-effect-free state machine for handling
//! one batch of received patch items. It parses items, filters out drops,
//! classifies apply outcomes and decides on notifications; the caller
//! (sync-client) performs the actual patch application and message sending,
//! then reports back with an [`InboundEvent`].
//!
//! ```text
//! Idle ──BatchReceived──▶ Parsing{i} ──drop──▶ Parsing{i+1}
//!                             │
//!                             ▼
//!                        Applying{i} ──ApplyFailed──▶ Parsing{i+1}
//!                             │ Applied
//!                             ▼
//!                        Notifying{i} ──Notified──▶ Parsing{i+1}
//!                                                    … ──exhausted──▶ Idle
//! ```
//!
//! Items are handled strictly in arrival order, one at a time.

use sync_types::{PatchEnvelope, PeerId};

use crate::classify::PathClassifier;
use crate::outcome::{ApplyOutcome, Notification, Verdict};
use crate::parse::{parse_item, safe_relative_path, EnvelopeParseError, ParsedItem};

/// Fixed inputs that decide what happens to inbound items.
#[derive(Debug, Clone)]
pub struct InboundPolicy {
    /// Project this peer tracks; items for other projects are dropped.
    pub project: String,
    /// This peer's own published identity (self-echo filter).
    pub local_author: PeerId,
    /// Recipient of conflict and success notifications.
    pub admin: PeerId,
    /// Sync eligibility of target paths.
    pub classifier: PathClassifier,
}

/// Where the machine is within the current batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundState {
    /// No batch in progress.
    Idle,
    /// Waiting for the patch service to apply item `index`.
    Applying {
        /// Position of the item in the batch.
        index: usize,
        /// The envelope being applied (path normalized).
        envelope: PatchEnvelope,
    },
    /// Waiting for the notification of item `index` to be sent.
    Notifying {
        /// Position of the item in the batch.
        index: usize,
    },
}

/// Events fed to the machine by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A batch of raw items arrived from the transport.
    BatchReceived {
        /// Raw item bytes, in delivery order.
        items: Vec<Vec<u8>>,
    },
    /// The patch service applied the current item.
    Applied {
        /// What the service produced.
        outcome: ApplyOutcome,
    },
    /// The patch service failed on the current item.
    ApplyFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// The notification for the current item was handed to the transport.
    Notified,
    /// The transport refused the notification for the current item.
    NotifyFailed {
        /// Error message describing the failure.
        error: String,
    },
}

/// Why an item produced no notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The item could not be parsed or validated.
    Malformed(EnvelopeParseError),
    /// The item was authored by this peer.
    SelfEcho,
    /// The patch service failed (or timed out) on the item.
    ApplyFailed(String),
}

/// Instructions for the caller.
///
/// These are instructions, not side effects. The caller interprets them and
/// performs the actual I/O, then answers with the matching event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundAction {
    /// Apply the envelope's diff to its target; answer with `Applied` or
    /// `ApplyFailed`.
    Apply {
        /// Position of the item in the batch.
        index: usize,
        /// Envelope to apply (path normalized).
        envelope: PatchEnvelope,
    },
    /// Send a notification; answer with `Notified` or `NotifyFailed`.
    Notify {
        /// Position of the item in the batch.
        index: usize,
        /// What to send and to whom.
        notification: Notification,
    },
    /// The item was dropped; informational, no answer expected.
    Drop {
        /// Position of the item in the batch.
        index: usize,
        /// Why it was dropped.
        reason: DropReason,
    },
    /// The batch is exhausted; the machine is idle again.
    Finish {
        /// Summary of the batch.
        report: BatchReport,
    },
}

/// What happened to one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDisposition {
    /// Dropped before or during apply.
    Dropped(DropReason),
    /// Applied with the given verdict.
    Applied(Verdict),
}

/// Per-batch counters and dispositions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Items in the batch.
    pub received: usize,
    /// Items dropped as malformed.
    pub malformed: usize,
    /// Items dropped as self-echo.
    pub self_echo: usize,
    /// Items that applied cleanly.
    pub clean: usize,
    /// Items that applied with a conflict.
    pub conflict: usize,
    /// Items the patch service failed on.
    pub failed: usize,
    /// Notifications the transport refused.
    pub notify_failed: usize,
    /// One disposition per item, in batch order.
    pub dispositions: Vec<ItemDisposition>,
}

impl BatchReport {
    fn new(received: usize) -> Self {
        Self {
            received,
            dispositions: Vec::with_capacity(received),
            ..Self::default()
        }
    }

    /// Items that reached the patch service and produced an outcome.
    pub fn applied(&self) -> usize {
        self.clean + self.conflict
    }

    /// Items that produced no notification.
    pub fn dropped(&self) -> usize {
        self.malformed + self.self_echo + self.failed
    }

    fn record_drop(&mut self, reason: &DropReason) {
        match reason {
            DropReason::Malformed(_) => self.malformed += 1,
            DropReason::SelfEcho => self.self_echo += 1,
            DropReason::ApplyFailed(_) => self.failed += 1,
        }
        self.dispositions
            .push(ItemDisposition::Dropped(reason.clone()));
    }

    fn record_verdict(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Clean => self.clean += 1,
            Verdict::Conflict => self.conflict += 1,
        }
        self.dispositions.push(ItemDisposition::Applied(verdict));
    }
}

/// The inbound state machine - NO I/O, just state transitions.
#[derive(Debug, Clone)]
pub struct InboundMachine {
    policy: InboundPolicy,
    state: InboundState,
    items: Vec<Vec<u8>>,
    report: BatchReport,
}

impl InboundMachine {
    /// Create an idle machine.
    pub fn new(policy: InboundPolicy) -> Self {
        Self {
            policy,
            state: InboundState::Idle,
            items: Vec::new(),
            report: BatchReport::default(),
        }
    }

    /// The policy this machine applies.
    pub fn policy(&self) -> &InboundPolicy {
        &self.policy
    }

    /// Current state.
    pub fn state(&self) -> &InboundState {
        &self.state
    }

    /// Whether no batch is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, InboundState::Idle)
    }

    /// Abandon any batch in progress and return to idle.
    ///
    /// The items not yet processed are discarded along with the partial
    /// report.
    pub fn reset(&mut self) {
        self.state = InboundState::Idle;
        self.items.clear();
        self.report = BatchReport::default();
    }

    /// Process an event and return the actions to execute.
    ///
    /// Events that make no sense in the current state are ignored and
    /// produce no actions.
    pub fn on_event(&mut self, event: InboundEvent) -> Vec<InboundAction> {
        let state = std::mem::replace(&mut self.state, InboundState::Idle);
        let mut actions = Vec::new();

        match (state, event) {
            (InboundState::Idle, InboundEvent::BatchReceived { items }) => {
                self.report = BatchReport::new(items.len());
                self.items = items;
                self.advance(0, &mut actions);
            }

            (InboundState::Applying { index, envelope }, InboundEvent::Applied { outcome }) => {
                let verdict = outcome.verdict();
                self.report.record_verdict(verdict);
                let notification = Notification {
                    recipient: self.policy.admin.clone(),
                    verdict,
                    project: envelope.project,
                    path: envelope.path,
                    author: envelope.author,
                    failed_hunks: outcome.failed_hunks(),
                };
                self.state = InboundState::Notifying { index };
                actions.push(InboundAction::Notify {
                    index,
                    notification,
                });
            }
            (InboundState::Applying { index, .. }, InboundEvent::ApplyFailed { error }) => {
                self.drop_item(index, DropReason::ApplyFailed(error), &mut actions);
                self.advance(index + 1, &mut actions);
            }

            (InboundState::Notifying { index }, InboundEvent::Notified) => {
                self.advance(index + 1, &mut actions);
            }
            (InboundState::Notifying { index }, InboundEvent::NotifyFailed { .. }) => {
                self.report.notify_failed += 1;
                self.advance(index + 1, &mut actions);
            }

            // Invalid transitions - stay in current state
            (state, _) => self.state = state,
        }

        actions
    }

    /// Walk items from `index` until one needs applying or the batch ends.
    fn advance(&mut self, mut index: usize, actions: &mut Vec<InboundAction>) {
        while index < self.items.len() {
            let bytes = std::mem::take(&mut self.items[index]);
            match self.admit(&bytes) {
                Ok(envelope) => {
                    self.state = InboundState::Applying {
                        index,
                        envelope: envelope.clone(),
                    };
                    actions.push(InboundAction::Apply { index, envelope });
                    return;
                }
                Err(reason) => self.drop_item(index, reason, actions),
            }
            index += 1;
        }

        self.items.clear();
        self.state = InboundState::Idle;
        actions.push(InboundAction::Finish {
            report: std::mem::take(&mut self.report),
        });
    }

    /// Parse and validate one item, in the order: fields, self-echo,
    /// project, path safety, sync eligibility.
    fn admit(&self, bytes: &[u8]) -> Result<PatchEnvelope, DropReason> {
        let mut envelope = match parse_item(bytes) {
            ParsedItem::Parsed(envelope) => envelope,
            ParsedItem::Malformed(error) => return Err(DropReason::Malformed(error)),
        };

        if envelope.author == self.policy.local_author {
            return Err(DropReason::SelfEcho);
        }
        if envelope.project != self.policy.project {
            return Err(DropReason::Malformed(EnvelopeParseError::ForeignProject(
                envelope.project,
            )));
        }

        envelope.path = safe_relative_path(&envelope.path).map_err(DropReason::Malformed)?;
        if !self.policy.classifier.should_sync(&envelope.path) {
            return Err(DropReason::Malformed(EnvelopeParseError::Excluded(
                envelope.path,
            )));
        }
        Ok(envelope)
    }

    fn drop_item(&mut self, index: usize, reason: DropReason, actions: &mut Vec<InboundAction>) {
        self.report.record_drop(&reason);
        actions.push(InboundAction::Drop { index, reason });
    }
}
