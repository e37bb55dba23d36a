//! Transient user-facing status messages.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tone of a feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Success,
    Error,
}

/// One feedback message with its own expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackMessage {
    pub kind: FeedbackKind,
    pub text: String,
    /// Unix epoch milliseconds when the message was issued.
    pub issued_at_ms: i64,
    /// `None` keeps the message until it is acknowledged.
    pub expires_after: Option<Duration>,
}

impl FeedbackMessage {
    /// Epoch milliseconds after which the message is no longer live.
    pub fn expires_at_ms(&self) -> Option<i64> {
        self.expires_after.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            self.issued_at_ms.saturating_add(ttl_ms)
        })
    }

    pub fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms().map_or(true, |deadline| now_ms < deadline)
    }

    pub fn is_sticky(&self) -> bool {
        self.expires_after.is_none()
    }
}
