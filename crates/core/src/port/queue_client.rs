// Queue Client Port (Interface)
// Named, at-least-once message queue with leased receive

use crate::domain::Lease;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// One leased message handed to a consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub body: String,
    pub lease: Lease,
    /// How many times this message has been received, this delivery included
    pub receive_count: u32,
}

impl Delivery {
    pub fn is_redelivery(&self) -> bool {
        self.receive_count > 1
    }
}

/// Queue transport errors
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Queue transport error: {0}")]
    Transport(String),
}

/// Queue client trait
///
/// Contract:
/// - `receive` is a bounded poll: it returns at most one message, or `None`
///   when nothing is visible, and never blocks indefinitely.
/// - A returned message always carries a valid, not-yet-expired lease.
/// - `acknowledge` removes the message permanently. It is a no-op, not an
///   error, once the lease has expired: the message may already belong to
///   another consumer.
/// - Transport failures are surfaced to the caller, never swallowed.
///
/// Implementations:
/// - SqliteQueueClient: durable queue shared by worker processes
/// - mocks::InMemoryQueueClient: single-process queue for tests
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Lease at most one visible message for `lease_duration`
    async fn receive(
        &self,
        queue: &str,
        lease_duration: Duration,
    ) -> Result<Option<Delivery>, QueueError>;

    /// Permanently remove the leased message
    async fn acknowledge(&self, queue: &str, lease: &Lease) -> Result<(), QueueError>;

    /// Append a message (at-least-once, no cross-producer ordering)
    async fn publish(&self, queue: &str, payload: &str) -> Result<(), QueueError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::TimeProvider;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Operation log entry, in call order
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum QueueOp {
        Receive { queue: String, message_id: Option<String> },
        Acknowledge { queue: String, message_id: String, removed: bool },
        Publish { queue: String, body: String },
    }

    #[derive(Debug, Clone)]
    struct StoredMessage {
        id: String,
        body: String,
        visible_at: i64,
        receipt_token: Option<String>,
        receive_count: u32,
    }

    #[derive(Default)]
    struct MemoryState {
        queues: HashMap<String, Vec<StoredMessage>>,
        ops: Vec<QueueOp>,
        receive_instants: Vec<tokio::time::Instant>,
        next_message: u64,
        next_receipt: u64,
        failing_receives: usize,
        failing_publishes: usize,
        failing_acknowledges: usize,
    }

    /// In-memory queue with lease (visibility) semantics
    ///
    /// Lease expiry is driven by the injected `TimeProvider`, so tests can
    /// simulate a crashed worker by dropping a delivery and advancing time.
    pub struct InMemoryQueueClient {
        state: Mutex<MemoryState>,
        time_provider: Arc<dyn TimeProvider>,
    }

    impl InMemoryQueueClient {
        pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
            Self {
                state: Mutex::new(MemoryState::default()),
                time_provider,
            }
        }

        /// Seed a message without recording an operation
        pub fn push(&self, queue: &str, body: impl Into<String>) -> String {
            let now = self.time_provider.now_millis();
            let mut state = self.state.lock().unwrap();
            state.next_message += 1;
            let id = format!("msg-{}", state.next_message);
            state.queues.entry(queue.to_string()).or_default().push(StoredMessage {
                id: id.clone(),
                body: body.into(),
                visible_at: now,
                receipt_token: None,
                receive_count: 0,
            });
            id
        }

        /// Bodies of every stored message (visible and in flight)
        pub fn bodies(&self, queue: &str) -> Vec<String> {
            let state = self.state.lock().unwrap();
            state
                .queues
                .get(queue)
                .map(|messages| messages.iter().map(|m| m.body.clone()).collect())
                .unwrap_or_default()
        }

        pub fn len(&self, queue: &str) -> usize {
            self.bodies(queue).len()
        }

        pub fn is_empty(&self, queue: &str) -> bool {
            self.len(queue) == 0
        }

        /// Number of messages currently visible to `receive`
        pub fn visible_len(&self, queue: &str) -> usize {
            let now = self.time_provider.now_millis();
            let state = self.state.lock().unwrap();
            state
                .queues
                .get(queue)
                .map(|messages| messages.iter().filter(|m| m.visible_at <= now).count())
                .unwrap_or(0)
        }

        pub fn ops(&self) -> Vec<QueueOp> {
            self.state.lock().unwrap().ops.clone()
        }

        /// Tokio instants of every `receive` call (for polling cadence tests)
        pub fn receive_instants(&self) -> Vec<tokio::time::Instant> {
            self.state.lock().unwrap().receive_instants.clone()
        }

        pub fn fail_next_receives(&self, count: usize) {
            self.state.lock().unwrap().failing_receives = count;
        }

        pub fn fail_next_publishes(&self, count: usize) {
            self.state.lock().unwrap().failing_publishes = count;
        }

        pub fn fail_next_acknowledges(&self, count: usize) {
            self.state.lock().unwrap().failing_acknowledges = count;
        }
    }

    #[async_trait]
    impl QueueClient for InMemoryQueueClient {
        async fn receive(
            &self,
            queue: &str,
            lease_duration: Duration,
        ) -> Result<Option<Delivery>, QueueError> {
            let now = self.time_provider.now_millis();
            let mut state = self.state.lock().unwrap();
            state.receive_instants.push(tokio::time::Instant::now());

            if state.failing_receives > 0 {
                state.failing_receives -= 1;
                return Err(QueueError::Transport("injected receive failure".to_string()));
            }

            state.next_receipt += 1;
            let receipt_token = format!("receipt-{}", state.next_receipt);
            let expires_at = Lease::expiry_from(now, lease_duration);

            let delivery = state
                .queues
                .get_mut(queue)
                .and_then(|messages| messages.iter_mut().find(|m| m.visible_at <= now))
                .map(|message| {
                    message.visible_at = expires_at;
                    message.receipt_token = Some(receipt_token.clone());
                    message.receive_count += 1;
                    Delivery {
                        body: message.body.clone(),
                        lease: Lease::new(message.id.clone(), receipt_token, expires_at),
                        receive_count: message.receive_count,
                    }
                });

            state.ops.push(QueueOp::Receive {
                queue: queue.to_string(),
                message_id: delivery.as_ref().map(|d| d.lease.message_id.clone()),
            });
            Ok(delivery)
        }

        async fn acknowledge(&self, queue: &str, lease: &Lease) -> Result<(), QueueError> {
            let now = self.time_provider.now_millis();
            let mut state = self.state.lock().unwrap();

            if state.failing_acknowledges > 0 {
                state.failing_acknowledges -= 1;
                return Err(QueueError::Transport(
                    "injected acknowledge failure".to_string(),
                ));
            }

            let mut removed = false;
            if let Some(messages) = state.queues.get_mut(queue) {
                let position = messages.iter().position(|m| {
                    m.id == lease.message_id
                        && m.receipt_token.as_deref() == Some(lease.receipt_token.as_str())
                        && now < m.visible_at
                });
                if let Some(position) = position {
                    messages.remove(position);
                    removed = true;
                }
            }

            state.ops.push(QueueOp::Acknowledge {
                queue: queue.to_string(),
                message_id: lease.message_id.clone(),
                removed,
            });
            Ok(())
        }

        async fn publish(&self, queue: &str, payload: &str) -> Result<(), QueueError> {
            let now = self.time_provider.now_millis();
            let mut state = self.state.lock().unwrap();

            if state.failing_publishes > 0 {
                state.failing_publishes -= 1;
                return Err(QueueError::Transport("injected publish failure".to_string()));
            }

            state.next_message += 1;
            let id = format!("msg-{}", state.next_message);
            state.queues.entry(queue.to_string()).or_default().push(StoredMessage {
                id,
                body: payload.to_string(),
                visible_at: now,
                receipt_token: None,
                receive_count: 0,
            });
            state.ops.push(QueueOp::Publish {
                queue: queue.to_string(),
                body: payload.to_string(),
            });
            Ok(())
        }
    }

}
