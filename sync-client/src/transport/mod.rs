//! Transport abstraction for patchsync.
//!
//! This module provides a pluggable publish/subscribe layer that abstracts
//! the underlying messaging system. Session setup, reconnection and
//! delivery guarantees are the implementation's concern; patchsync only
//! needs three operations.
//!
//! # Design
//!
//! - `publish()` fans one encoded item out to every subscriber
//! - `send_message()` delivers a plain-text message to one recipient
//! - `recv_batch()` yields the items attached to the next inbound event
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.publish(&envelope.to_bytes()?).await?;
//! transport.send_message(&admin, "Conflict detected").await?;
//! let items = transport.recv_batch().await?;
//! ```

mod mock;

pub use mock::MockTransport;

use async_trait::async_trait;
use sync_types::PeerId;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection closed; no further batches will arrive.
    #[error("connection closed")]
    ConnectionClosed,

    /// Publish failed.
    #[error("publish failed: {0}")]
    PublishFailed(String),

    /// Direct message failed.
    #[error("message to {recipient} failed: {reason}")]
    MessageFailed {
        /// Intended recipient.
        recipient: PeerId,
        /// Why delivery failed.
        reason: String,
    },

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Transport trait for the patchsync pub/sub channel.
///
/// Implementations handle the underlying messaging system. Publishing is
/// fire-and-forget: a successful return means the item was handed over,
/// not that any subscriber received it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish one encoded item to all subscribers.
    async fn publish(&self, item: &[u8]) -> Result<(), TransportError>;

    /// Send a plain-text message to a single recipient.
    async fn send_message(&self, recipient: &PeerId, body: &str) -> Result<(), TransportError>;

    /// Receive the items of the next inbound event, in delivery order.
    ///
    /// Returns [`TransportError::ConnectionClosed`] when no more events will
    /// arrive.
    async fn recv_batch(&self) -> Result<Vec<Vec<u8>>, TransportError>;
}
