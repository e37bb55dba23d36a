//! Registration engine.
//!
//! # Responsibility
//! - Validate a sign-up draft and derive its credential digest.
//! - Build the account record and its redacted notification as a pair.
//! - Guard against re-entry while a derivation is outstanding.
//!
//! # Invariants
//! - At most one submission is in flight; `begin` refuses a second one.
//! - Records are built only after a successful derivation, and always as an
//!   (account, notification) pair.
//! - The plaintext secret never outlives `PendingSubmission`.
//!
//! # Flow
//! `begin` (validate, mark in flight) -> `derive` (may run off the owning
//! context) -> `complete` (clear in-flight flag, build records).

use crate::credential::{CredentialDeriver, CredentialDigest, CredentialError};
use crate::model::account::{Account, AccountId};
use crate::model::form::{SignupForm, ValidationError};
use crate::model::notification::{Notification, NotificationId};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

/// Submission failure. Terminal to the submission; no records are created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    Validation(ValidationError),
    CryptoUnavailable(CredentialError),
    /// A previous submission has not completed yet.
    SubmissionInFlight,
    /// `complete` was handed a submission this engine is not waiting for.
    StaleSubmission,
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CryptoUnavailable(err) => write!(f, "{err}"),
            Self::SubmissionInFlight => write!(f, "a submission is already in flight"),
            Self::StaleSubmission => write!(f, "submission is not the one in flight"),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::CryptoUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for SubmitError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CredentialError> for SubmitError {
    fn from(value: CredentialError) -> Self {
        Self::CryptoUnavailable(value)
    }
}

/// Identifiers of a completed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub account_id: AccountId,
    pub notification_id: NotificationId,
    /// Both collection writes succeeded.
    pub persisted: bool,
}

/// A validated submission waiting for its credential digest.
pub struct PendingSubmission {
    ticket: u64,
    name: String,
    email: String,
    secret: String,
    extra: String,
}

impl PendingSubmission {
    /// Secret to feed to a `CredentialDeriver`.
    pub fn secret(&self) -> &str {
        self.secret.as_str()
    }
}

impl Debug for PendingSubmission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Stateful registration engine owning the deriver and in-flight guard.
#[derive(Debug)]
pub struct RegistrationEngine<D: CredentialDeriver> {
    deriver: D,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl<D: CredentialDeriver> RegistrationEngine<D> {
    pub fn new(deriver: D) -> Self {
        Self {
            deriver,
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Validates `form` and marks a submission in flight.
    ///
    /// Name, email and extra are trimmed; the secret is kept as entered.
    pub fn begin(&mut self, form: &SignupForm) -> Result<PendingSubmission, SubmitError> {
        if self.in_flight.is_some() {
            return Err(SubmitError::SubmissionInFlight);
        }
        form.validate()?;

        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.in_flight = Some(ticket);

        Ok(PendingSubmission {
            ticket,
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            secret: form.secret.clone(),
            extra: form.extra.trim().to_string(),
        })
    }

    /// Runs the engine's own deriver over a pending submission.
    pub fn derive(&self, pending: &PendingSubmission) -> Result<CredentialDigest, CredentialError> {
        self.deriver.derive(pending.secret())
    }

    /// Finishes a pending submission and builds its record pair.
    ///
    /// Clears the in-flight flag whether or not derivation succeeded.
    pub fn complete(
        &mut self,
        pending: PendingSubmission,
        digest: Result<CredentialDigest, CredentialError>,
        now_ms: i64,
    ) -> Result<(Account, Notification), SubmitError> {
        if self.in_flight != Some(pending.ticket) {
            return Err(SubmitError::StaleSubmission);
        }
        self.in_flight = None;

        let digest = digest?;
        let account = Account::new(
            Uuid::now_v7(),
            pending.name,
            pending.email,
            pending.extra,
            now_ms,
            digest,
        );
        let notification = Notification::sign_up(&account);
        Ok((account, notification))
    }
}
