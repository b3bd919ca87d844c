//! Mock transport for testing.
//!
//! Allows queueing inbound batches and capturing published items and
//! messages for verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use sync_types::PeerId;

/// Mock transport for testing.
///
/// Clones share state, so one clone can be handed to a broadcaster and
/// another to a handler while the test inspects a third.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    published: Vec<Vec<u8>>,
    messages: Vec<(PeerId, String)>,
    inbound: VecDeque<Vec<Vec<u8>>>,
    fail_next_publish: Option<String>,
    fail_next_message: Option<String>,
    fail_next_recv: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MockTransportInner> {
        // A panicking test thread must not wedge the other clones.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a batch to be returned by the next `recv_batch()` call.
    pub fn queue_batch(&self, items: Vec<Vec<u8>>) {
        self.inner().inbound.push_back(items);
    }

    /// Get all items that were published.
    pub fn published(&self) -> Vec<Vec<u8>> {
        self.inner().published.clone()
    }

    /// Get the last item that was published.
    pub fn last_published(&self) -> Option<Vec<u8>> {
        self.inner().published.last().cloned()
    }

    /// Get all direct messages that were sent, as `(recipient, body)`.
    pub fn messages(&self) -> Vec<(PeerId, String)> {
        self.inner().messages.clone()
    }

    /// Cause the next publish() to fail with the given error.
    pub fn fail_next_publish(&self, error: &str) {
        self.inner().fail_next_publish = Some(error.to_string());
    }

    /// Cause the next send_message() to fail with the given error.
    pub fn fail_next_message(&self, error: &str) {
        self.inner().fail_next_message = Some(error.to_string());
    }

    /// Cause the next recv_batch() to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        self.inner().fail_next_recv = Some(error.to_string());
    }

    /// Clear all state (items, messages, queue).
    pub fn reset(&self) {
        *self.inner() = MockTransportInner::default();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn publish(&self, item: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner();

        // Check for forced failure
        if let Some(error) = inner.fail_next_publish.take() {
            return Err(TransportError::PublishFailed(error));
        }

        inner.published.push(item.to_vec());
        Ok(())
    }

    async fn send_message(&self, recipient: &PeerId, body: &str) -> Result<(), TransportError> {
        let mut inner = self.inner();

        if let Some(reason) = inner.fail_next_message.take() {
            return Err(TransportError::MessageFailed {
                recipient: recipient.clone(),
                reason,
            });
        }

        inner.messages.push((recipient.clone(), body.to_string()));
        Ok(())
    }

    async fn recv_batch(&self) -> Result<Vec<Vec<u8>>, TransportError> {
        let mut inner = self.inner();

        if let Some(error) = inner.fail_next_recv.take() {
            return Err(TransportError::ReceiveFailed(error));
        }

        inner
            .inbound
            .pop_front()
            .ok_or(TransportError::ConnectionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> PeerId {
        PeerId::new("admin@example.org").unwrap()
    }

    // ===========================================
    // MockTransport Basic Tests
    // ===========================================

    #[tokio::test]
    async fn mock_transport_captures_published_items() {
        let transport = MockTransport::new();

        transport.publish(b"item 1").await.unwrap();
        transport.publish(b"item 2").await.unwrap();

        let published = transport.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0], b"item 1");
        assert_eq!(transport.last_published(), Some(b"item 2".to_vec()));
    }

    #[tokio::test]
    async fn mock_transport_captures_messages() {
        let transport = MockTransport::new();
        transport.send_message(&admin(), "hello").await.unwrap();

        assert_eq!(transport.messages(), vec![(admin(), "hello".to_string())]);
    }

    #[tokio::test]
    async fn mock_transport_returns_batches_in_order() {
        let transport = MockTransport::new();
        transport.queue_batch(vec![b"a".to_vec(), b"b".to_vec()]);
        transport.queue_batch(vec![b"c".to_vec()]);

        assert_eq!(transport.recv_batch().await.unwrap().len(), 2);
        assert_eq!(transport.recv_batch().await.unwrap(), vec![b"c".to_vec()]);
    }

    #[tokio::test]
    async fn mock_transport_recv_empty_returns_closed() {
        let transport = MockTransport::new();
        let result = transport.recv_batch().await;
        assert!(matches!(result, Err(TransportError::ConnectionClosed)));
    }

    // ===========================================
    // Error Condition Tests
    // ===========================================

    #[tokio::test]
    async fn forced_publish_failure() {
        let transport = MockTransport::new();
        transport.fail_next_publish("node gone");

        let result = transport.publish(b"data").await;
        assert!(matches!(result, Err(TransportError::PublishFailed(_))));

        // Next publish should work
        transport.publish(b"data").await.unwrap();
        assert_eq!(transport.published().len(), 1);
    }

    #[tokio::test]
    async fn forced_message_failure() {
        let transport = MockTransport::new();
        transport.fail_next_message("recipient offline");

        let result = transport.send_message(&admin(), "hi").await;
        assert!(matches!(result, Err(TransportError::MessageFailed { .. })));
        assert!(transport.messages().is_empty());
    }

    #[tokio::test]
    async fn forced_recv_failure() {
        let transport = MockTransport::new();
        transport.queue_batch(vec![b"data".to_vec()]);
        transport.fail_next_recv("timeout");

        let result = transport.recv_batch().await;
        assert!(matches!(result, Err(TransportError::ReceiveFailed(_))));

        // Next recv should work (and get the queued batch)
        assert_eq!(transport.recv_batch().await.unwrap(), vec![b"data".to_vec()]);
    }

    #[tokio::test]
    async fn every_failure_mode_is_reachable() {
        let transport = MockTransport::new();
        transport.fail_next_publish("node gone");
        transport.fail_next_message("recipient offline");
        transport.fail_next_recv("timeout");

        let errors = vec![
            transport.publish(b"data").await.unwrap_err(),
            transport.send_message(&admin(), "hi").await.unwrap_err(),
            transport.recv_batch().await.unwrap_err(),
            transport.recv_batch().await.unwrap_err(),
        ];

        for error in &errors {
            let expected = match error {
                TransportError::ConnectionClosed => "connection closed",
                TransportError::PublishFailed(_) => "publish failed: node gone",
                TransportError::MessageFailed { .. } => {
                    "message to admin@example.org failed: recipient offline"
                }
                TransportError::ReceiveFailed(_) => "receive failed: timeout",
            };
            assert_eq!(error.to_string(), expected);
        }
        assert!(matches!(errors[3], TransportError::ConnectionClosed));
    }

    // ===========================================
    // Clone and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn mock_transport_clone_shares_state() {
        let transport1 = MockTransport::new();
        let transport2 = transport1.clone();

        transport1.publish(b"from t1").await.unwrap();
        transport2.publish(b"from t2").await.unwrap();

        assert_eq!(transport1.published().len(), 2);
    }

    #[tokio::test]
    async fn mock_transport_reset_clears_all() {
        let transport = MockTransport::new();
        transport.publish(b"data").await.unwrap();
        transport.send_message(&admin(), "note").await.unwrap();
        transport.queue_batch(vec![b"x".to_vec()]);

        transport.reset();

        assert!(transport.published().is_empty());
        assert!(transport.messages().is_empty());
        assert!(transport.recv_batch().await.is_err());
    }
}
