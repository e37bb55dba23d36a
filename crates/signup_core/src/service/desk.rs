//! Sign-up desk: the single owner of all mutable state.
//!
//! # Responsibility
//! - Own accounts, notifications, gate state, feedback and the form draft.
//! - Funnel every mutation through one `&mut self` operation and write the
//!   affected collections through to storage.
//!
//! # Invariants
//! - Registry and feed change together on submit, or not at all.
//! - Removing an account leaves the feed untouched; clearing the feed leaves
//!   accounts untouched.
//! - Reviewer views are only produced while the gate is unlocked.
//! - Persistence is best-effort. A failed write is logged and reported but
//!   never rolls back memory, and no transaction spans the two collections.

use crate::clock::{Clock, SystemClock};
use crate::config::DeskConfig;
use crate::credential::{CredentialDeriver, CredentialDigest, CredentialError, Sha256Deriver};
use crate::model::account::{AccountId, AccountSummary};
use crate::model::feedback::{FeedbackKind, FeedbackMessage};
use crate::model::form::{FormField, SignupForm};
use crate::model::notification::Notification;
use crate::repo::collection_repo::{CollectionKey, CollectionRepository, PersistError};
use crate::repo::kv_repo::KvStore;
use crate::service::feed_service::FeedController;
use crate::service::feedback_service::FeedbackNotifier;
use crate::service::gate_service::{AccessGate, GateOutcome, GateState};
use crate::service::registration_service::{
    PendingSubmission, RegistrationEngine, SubmitError, SubmitReceipt,
};
use crate::service::registry_service::AccountRegistry;
use log::{error, info, warn};

pub const SUCCESS_TEXT: &str = "Signed up successfully";
pub const MISSING_FIELD_TEXT: &str = "Please fill name, email and password.";
pub const CRYPTO_UNAVAILABLE_TEXT: &str =
    "Secure hashing is unavailable in this environment; sign-up is disabled.";
pub const IN_FLIGHT_TEXT: &str = "Your previous sign-up is still being processed.";

/// What happened while loading persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    pub accounts_loaded: usize,
    pub notifications_loaded: usize,
    /// Collections that were unreadable and started empty.
    pub reset_collections: Vec<CollectionKey>,
}

/// Snapshot of the gated reviewer panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerPanel {
    pub accounts: Vec<AccountSummary>,
    pub notifications: Vec<Notification>,
}

pub struct SignupDesk<S: KvStore, D: CredentialDeriver = Sha256Deriver, C: Clock = SystemClock> {
    repo: CollectionRepository<S>,
    engine: RegistrationEngine<D>,
    registry: AccountRegistry,
    feed: FeedController,
    gate: AccessGate,
    feedback: FeedbackNotifier,
    form: SignupForm,
    /// Draft as it was when the in-flight submission began.
    submitted_form: Option<SignupForm>,
    clock: C,
    config: DeskConfig,
    startup: StartupReport,
}

impl<S: KvStore> SignupDesk<S> {
    /// Opens a desk with the SHA-256 deriver and the system clock.
    pub fn open(store: S, config: DeskConfig) -> Self {
        Self::open_with(store, config, Sha256Deriver, SystemClock)
    }
}

impl<S: KvStore, D: CredentialDeriver, C: Clock> SignupDesk<S, D, C> {
    /// Opens a desk, loading both collections once.
    ///
    /// An unreadable collection starts empty and is listed in
    /// `startup_report().reset_collections`.
    pub fn open_with(store: S, config: DeskConfig, deriver: D, clock: C) -> Self {
        let repo = CollectionRepository::new(store);
        let mut startup = StartupReport::default();

        let accounts = recover_collection(
            CollectionKey::Accounts,
            repo.load_accounts(),
            &mut startup,
        );
        let notifications = recover_collection(
            CollectionKey::Notifications,
            repo.load_notifications(),
            &mut startup,
        );
        startup.accounts_loaded = accounts.len();
        startup.notifications_loaded = notifications.len();

        info!(
            "event=desk_open module=desk status=ok accounts={} notifications={} reset={}",
            startup.accounts_loaded,
            startup.notifications_loaded,
            startup.reset_collections.len()
        );

        Self {
            repo,
            engine: RegistrationEngine::new(deriver),
            registry: AccountRegistry::from_records(accounts),
            feed: FeedController::from_records(notifications),
            gate: AccessGate::new(&config),
            feedback: FeedbackNotifier::new(),
            form: SignupForm::default(),
            submitted_form: None,
            clock,
            config,
            startup,
        }
    }

    pub fn startup_report(&self) -> &StartupReport {
        &self.startup
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn repository(&self) -> &CollectionRepository<S> {
        &self.repo
    }

    // --- form -------------------------------------------------------------

    pub fn form(&self) -> &SignupForm {
        &self.form
    }

    pub fn set_form_field(&mut self, field: FormField, value: impl Into<String>) {
        self.form.set(field, value);
    }

    // --- registration -----------------------------------------------------

    /// Submits a registration: validate, derive, record, persist, notify.
    ///
    /// The request replaces the form draft. On success the draft is cleared
    /// if it still holds the submitted request; on failure it keeps what was
    /// entered.
    pub fn submit(&mut self, request: SignupForm) -> Result<SubmitReceipt, SubmitError> {
        let pending = self.begin_submission(request)?;
        let digest = self.engine.derive(&pending);
        self.complete_submission(pending, digest)
    }

    /// Submits whatever the form draft currently holds.
    pub fn submit_form(&mut self) -> Result<SubmitReceipt, SubmitError> {
        let request = self.form.clone();
        self.submit(request)
    }

    /// First half of a split submission; marks the desk as in flight.
    ///
    /// The caller derives `pending.secret()` (possibly outside whatever lock
    /// guards the desk) and hands the result to `complete_submission`.
    pub fn begin_submission(
        &mut self,
        request: SignupForm,
    ) -> Result<PendingSubmission, SubmitError> {
        self.form = request;
        match self.engine.begin(&self.form) {
            Ok(pending) => {
                self.submitted_form = Some(self.form.clone());
                Ok(pending)
            }
            Err(err) => {
                self.report_submit_error(&err);
                Err(err)
            }
        }
    }

    /// Second half of a split submission.
    pub fn complete_submission(
        &mut self,
        pending: PendingSubmission,
        digest: Result<CredentialDigest, CredentialError>,
    ) -> Result<SubmitReceipt, SubmitError> {
        let now_ms = self.clock.now_ms();
        let (account, notification) = match self.engine.complete(pending, digest, now_ms) {
            Ok(records) => records,
            Err(SubmitError::StaleSubmission) => {
                self.report_submit_error(&SubmitError::StaleSubmission);
                return Err(SubmitError::StaleSubmission);
            }
            Err(err) => {
                self.submitted_form = None;
                self.report_submit_error(&err);
                return Err(err);
            }
        };

        let account_id = account.id();
        let notification_id = notification.id.clone();
        self.registry.prepend(account);
        self.feed.prepend(notification);

        let accounts_saved = self.persist(CollectionKey::Accounts);
        let notifications_saved = self.persist(CollectionKey::Notifications);

        self.feedback.notify(
            FeedbackKind::Success,
            SUCCESS_TEXT,
            now_ms,
            Some(self.config.feedback_ttl),
        );
        // A draft entered while the derivation was running is kept.
        if self.submitted_form.take().as_ref() == Some(&self.form) {
            self.form = SignupForm::default();
        }

        info!(
            "event=signup_submit module=desk status=ok accounts={} notifications={} persisted={}",
            self.registry.len(),
            self.feed.len(),
            accounts_saved && notifications_saved
        );
        Ok(SubmitReceipt {
            account_id,
            notification_id,
            persisted: accounts_saved && notifications_saved,
        })
    }

    pub fn submission_in_flight(&self) -> bool {
        self.engine.is_in_flight()
    }

    // --- feedback ---------------------------------------------------------

    /// Live feedback message, if any.
    pub fn feedback(&mut self) -> Option<&FeedbackMessage> {
        let now_ms = self.clock.now_ms();
        self.feedback.active(now_ms)
    }

    /// Dismisses the current feedback message (required for sticky errors).
    pub fn acknowledge_feedback(&mut self) -> bool {
        self.feedback.acknowledge()
    }

    // --- gate -------------------------------------------------------------

    /// Tries to unlock the reviewer panel; returns whether the code matched.
    pub fn attempt_gate(&mut self, candidate: &str) -> bool {
        self.attempt_gate_outcome(candidate).is_match()
    }

    pub fn attempt_gate_outcome(&mut self, candidate: &str) -> GateOutcome {
        let now_ms = self.clock.now_ms();
        self.gate.attempt(candidate, now_ms)
    }

    pub fn gate_unlocked(&self) -> bool {
        self.gate.is_unlocked()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Live welcome or mismatch notice from the last gate attempt.
    pub fn gate_notice(&mut self) -> Option<&FeedbackMessage> {
        let now_ms = self.clock.now_ms();
        self.gate.notice(now_ms)
    }

    // --- reviewer panel ---------------------------------------------------

    /// Accounts and notifications, or `None` while the gate is locked.
    pub fn reviewer_panel(&self) -> Option<ReviewerPanel> {
        if !self.gate.is_unlocked() {
            return None;
        }
        Some(ReviewerPanel {
            accounts: self.registry.views(),
            notifications: self.feed.notifications().to_vec(),
        })
    }

    /// Pretty JSON of one account's non-credential fields.
    ///
    /// `None` while locked or when the id is unknown.
    pub fn export_account(&self, id: AccountId) -> Option<String> {
        if !self.gate.is_unlocked() {
            return None;
        }
        let export = self.registry.export(id)?;
        match serde_json::to_string_pretty(&export) {
            Ok(blob) => Some(blob),
            Err(err) => {
                error!("event=account_export module=desk status=error error={err}");
                None
            }
        }
    }

    /// Removes one account and persists the registry.
    ///
    /// The correlated notification stays in the feed.
    pub fn remove_account(&mut self, id: AccountId) -> bool {
        if !self.registry.remove(id) {
            info!("event=account_remove module=desk status=not_found");
            return false;
        }
        self.persist(CollectionKey::Accounts);
        info!(
            "event=account_remove module=desk status=ok accounts={}",
            self.registry.len()
        );
        true
    }

    /// Empties the feed and persists the empty collection.
    pub fn clear_notifications(&mut self) -> usize {
        let cleared = self.feed.clear();
        self.persist(CollectionKey::Notifications);
        info!("event=feed_clear module=desk status=ok cleared={cleared}");
        cleared
    }

    pub fn account_count(&self) -> usize {
        self.registry.len()
    }

    pub fn notification_count(&self) -> usize {
        self.feed.len()
    }

    fn persist(&self, key: CollectionKey) -> bool {
        let result = match key {
            CollectionKey::Accounts => self.repo.save_accounts(self.registry.records()),
            CollectionKey::Notifications => self.repo.save_notifications(self.feed.notifications()),
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "event=write_through module=desk status=error key={} error={}",
                    key.as_str(),
                    err
                );
                false
            }
        }
    }

    fn report_submit_error(&mut self, err: &SubmitError) {
        let now_ms = self.clock.now_ms();
        let (text, ttl, code) = match err {
            SubmitError::Validation(_) => (
                MISSING_FIELD_TEXT,
                Some(self.config.feedback_ttl),
                "missing_field",
            ),
            SubmitError::CryptoUnavailable(_) => {
                (CRYPTO_UNAVAILABLE_TEXT, None, "crypto_unavailable")
            }
            SubmitError::SubmissionInFlight | SubmitError::StaleSubmission => (
                IN_FLIGHT_TEXT,
                Some(self.config.feedback_ttl),
                "in_flight",
            ),
        };
        self.feedback.notify(FeedbackKind::Error, text, now_ms, ttl);

        if matches!(err, SubmitError::CryptoUnavailable(_)) {
            error!("event=signup_submit module=desk status=error error_code={code} error={err}");
        } else {
            info!("event=signup_submit module=desk status=rejected error_code={code}");
        }
    }
}

fn recover_collection<T>(
    key: CollectionKey,
    loaded: Result<Vec<T>, PersistError>,
    startup: &mut StartupReport,
) -> Vec<T> {
    match loaded {
        Ok(items) => items,
        Err(err) => {
            warn!(
                "event=collection_load module=desk status=reset key={} error={}",
                key.as_str(),
                err
            );
            startup.reset_collections.push(key);
            Vec::new()
        }
    }
}
