//! Core state-and-notification engine for the sign-up desk.
//! This crate is the single source of truth for registration invariants.

pub mod clock;
pub mod config;
pub mod credential;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DeskConfig, GateConfig};
pub use credential::{CredentialDeriver, CredentialDigest, CredentialError, Sha256Deriver};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{AccountExport, AccountId, AccountSummary};
pub use model::feedback::{FeedbackKind, FeedbackMessage};
pub use model::form::{FormField, SignupForm, ValidationError};
pub use model::notification::{Notification, NotificationId};
pub use repo::collection_repo::{CollectionKey, CollectionRepository, PersistError};
pub use repo::kv_repo::{KvStore, RepoError, RepoResult, SqliteKvStore};
pub use service::desk::{ReviewerPanel, SignupDesk, StartupReport};
pub use service::gate_service::{GateOutcome, GateState};
pub use service::registration_service::{PendingSubmission, SubmitError, SubmitReceipt};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
