// Lease Domain Model

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque, queue-assigned receipt for one delivery of a message
pub type ReceiptToken = String;

/// Lease - temporary exclusive claim on a received message
///
/// Issued by the queue at receive time. The worker never persists it:
/// it is consumed by `acknowledge` or simply dropped, in which case the
/// message becomes visible again once `expires_at` has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub message_id: String,
    pub receipt_token: ReceiptToken,
    pub expires_at: i64, // epoch ms
}

impl Lease {
    pub fn new(
        message_id: impl Into<String>,
        receipt_token: impl Into<ReceiptToken>,
        expires_at: i64,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            receipt_token: receipt_token.into(),
            expires_at,
        }
    }

    /// Compute the expiry for a lease granted at `now_millis`
    pub fn expiry_from(now_millis: i64, duration: Duration) -> i64 {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        now_millis.saturating_add(millis)
    }

    /// A lease is valid strictly before its expiry instant
    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis >= self.expires_at
    }

    /// Remaining validity (zero once expired)
    pub fn remaining(&self, now_millis: i64) -> Duration {
        let left = self.expires_at.saturating_sub(now_millis).max(0);
        Duration::from_millis(left as u64)
    }
}
