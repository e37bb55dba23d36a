//! Transient feedback shown to the submitter.
//!
//! # Invariants
//! - At most one message is held; a new message replaces the old one.
//! - Expiry is computed from the clock on read. There is no timer, so a
//!   superseded message has nothing left to fire.

use crate::model::feedback::{FeedbackKind, FeedbackMessage};
use std::time::Duration;

/// Holder for the single live feedback message.
#[derive(Debug, Default)]
pub struct FeedbackNotifier {
    current: Option<FeedbackMessage>,
}

impl FeedbackNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any current message.
    ///
    /// `ttl = None` keeps the message until `acknowledge` is called.
    pub fn notify(
        &mut self,
        kind: FeedbackKind,
        text: impl Into<String>,
        now_ms: i64,
        ttl: Option<Duration>,
    ) {
        self.current = Some(FeedbackMessage {
            kind,
            text: text.into(),
            issued_at_ms: now_ms,
            expires_after: ttl,
        });
    }

    /// Returns the live message at `now_ms`, dropping an expired one.
    pub fn active(&mut self, now_ms: i64) -> Option<&FeedbackMessage> {
        if self
            .current
            .as_ref()
            .is_some_and(|message| !message.is_live(now_ms))
        {
            self.current = None;
        }
        self.current.as_ref()
    }

    /// Clears the current message, sticky or not.
    pub fn acknowledge(&mut self) -> bool {
        self.current.take().is_some()
    }
}
