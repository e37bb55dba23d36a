//! Access gate guarding the reviewer panel.
//!
//! # Responsibility
//! - Hold the shared `unlocked` flag and compare attempts to the configured
//!   reference secret.
//! - Produce the transient welcome / mismatch notice.
//!
//! # Invariants
//! - Starts locked; unlocks only on an exact, case-sensitive match of the
//!   trimmed candidate.
//! - Never relocks once unlocked.
//! - Without a configured secret, every attempt is a mismatch.
//! - Lockout applies only when `max_failed_attempts` is configured; the
//!   default is unlimited attempts.

use crate::config::{DeskConfig, GateConfig};
use crate::model::feedback::{FeedbackKind, FeedbackMessage};
use log::{info, warn};
use std::time::Duration;
use subtle::ConstantTimeEq;

pub const WELCOME_TEXT: &str = "Welcome, reviewer.";
pub const MISMATCH_TEXT: &str = "Incorrect access code.";
pub const LOCKED_OUT_TEXT: &str = "Too many attempts; access is locked.";

/// Result of a single gate attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Candidate matched; the panel is visible.
    Unlocked,
    /// Candidate did not match (or no secret is configured).
    Mismatch,
    /// The configured failure limit was reached; attempts are refused.
    LockedOut,
}

impl GateOutcome {
    pub fn is_match(self) -> bool {
        matches!(self, Self::Unlocked)
    }
}

/// Shared gate state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateState {
    pub unlocked: bool,
    pub failed_attempts: u32,
}

#[derive(Debug)]
pub struct AccessGate {
    config: GateConfig,
    welcome_ttl: Duration,
    error_ttl: Duration,
    state: GateState,
    notice: Option<FeedbackMessage>,
}

impl AccessGate {
    pub fn new(config: &DeskConfig) -> Self {
        if config.gate.reference_secret().is_none() {
            warn!("event=gate_init module=gate status=unconfigured reason=missing_secret");
        }
        Self {
            config: config.gate.clone(),
            welcome_ttl: config.welcome_ttl,
            error_ttl: config.gate_error_ttl,
            state: GateState::default(),
            notice: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state.unlocked
    }

    pub fn is_locked_out(&self) -> bool {
        self.config
            .max_failed_attempts
            .is_some_and(|limit| self.state.failed_attempts >= limit)
    }

    /// Compares `candidate` against the reference secret.
    pub fn attempt(&mut self, candidate: &str, now_ms: i64) -> GateOutcome {
        if self.is_locked_out() {
            self.set_notice(FeedbackKind::Error, LOCKED_OUT_TEXT, now_ms, self.error_ttl);
            warn!(
                "event=gate_attempt module=gate status=locked_out failed_attempts={}",
                self.state.failed_attempts
            );
            return GateOutcome::LockedOut;
        }

        let matched = self
            .config
            .reference_secret()
            .is_some_and(|secret| constant_time_eq(candidate.trim(), secret));

        if matched {
            self.state.unlocked = true;
            self.state.failed_attempts = 0;
            self.set_notice(FeedbackKind::Success, WELCOME_TEXT, now_ms, self.welcome_ttl);
            info!("event=gate_attempt module=gate status=ok");
            return GateOutcome::Unlocked;
        }

        self.state.failed_attempts = self.state.failed_attempts.saturating_add(1);
        self.set_notice(FeedbackKind::Error, MISMATCH_TEXT, now_ms, self.error_ttl);
        info!(
            "event=gate_attempt module=gate status=mismatch failed_attempts={}",
            self.state.failed_attempts
        );
        GateOutcome::Mismatch
    }

    /// Returns the live welcome/mismatch notice at `now_ms`.
    pub fn notice(&mut self, now_ms: i64) -> Option<&FeedbackMessage> {
        if self
            .notice
            .as_ref()
            .is_some_and(|notice| !notice.is_live(now_ms))
        {
            self.notice = None;
        }
        self.notice.as_ref()
    }

    fn set_notice(&mut self, kind: FeedbackKind, text: &str, now_ms: i64, ttl: Duration) {
        self.notice = Some(FeedbackMessage {
            kind,
            text: text.to_string(),
            issued_at_ms: now_ms,
            expires_after: Some(ttl),
        });
    }
}

/// Byte comparison that does not short-circuit on content.
fn constant_time_eq(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}
