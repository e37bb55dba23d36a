//! FFI use-case API for the Flutter sign-up screens.
//!
//! # Responsibility
//! - Expose the desk operations to Dart via FRB as plain envelopes.
//! - Own the process-wide desk behind one mutex (the single mutation path).
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - No envelope carries a credential derivative or a submitted secret.
//! - Credential derivation runs with the desk lock released; the desk's
//!   in-flight guard refuses overlapping submissions meanwhile.

use log::{info, warn};
use signup_core::config::resolve_db_path;
use signup_core::db::open_db;
use signup_core::service::desk::{
    CRYPTO_UNAVAILABLE_TEXT, IN_FLIGHT_TEXT, MISSING_FIELD_TEXT, SUCCESS_TEXT,
};
use signup_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AccountId, AccountSummary, CredentialDeriver, DeskConfig, FeedbackKind, FeedbackMessage,
    GateOutcome, Notification, Sha256Deriver, SignupDesk, SignupForm, SqliteKvStore,
    SubmitError,
};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

type FfiDesk = SignupDesk<SqliteKvStore>;

struct DeskSlot {
    db_path: PathBuf,
    desk: FfiDesk,
}

static DESK: Mutex<Option<DeskSlot>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens (or reopens) the desk with explicit host configuration.
///
/// `db_path` empty -> `SIGNUP_DB_PATH` or the temp-dir default.
/// `gate_secret` `None` -> `SIGNUP_GATE_SECRET`.
/// Returns an empty string on success and an error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn desk_init(db_path: String, gate_secret: Option<String>) -> String {
    let path = match db_path.trim() {
        "" => resolve_db_path(),
        explicit => PathBuf::from(explicit),
    };
    let mut config = DeskConfig::from_env();
    if let Some(secret) = gate_secret {
        config.gate.secret = Some(secret);
    }

    match open_desk(&path, config) {
        Ok(desk) => {
            info!("event=desk_init module=ffi status=ok");
            *lock_slot() = Some(DeskSlot {
                db_path: path,
                desk,
            });
            String::new()
        }
        Err(err) => {
            warn!("event=desk_init module=ffi status=error");
            err
        }
    }
}

/// Path of the database backing the open desk, if one is open.
#[flutter_rust_bridge::frb(sync)]
pub fn desk_db_path() -> Option<String> {
    lock_slot()
        .as_ref()
        .map(|slot| slot.db_path.display().to_string())
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Created or affected record id, when there is one.
    pub id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Outcome of `signup_submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub ok: bool,
    pub account_id: Option<String>,
    /// Both collections reached storage; `false` means memory-only.
    pub persisted: bool,
    pub message: String,
}

impl SubmitResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            account_id: None,
            persisted: false,
            message: message.into(),
        }
    }
}

/// Live feedback or gate notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackItem {
    /// `success` or `error`.
    pub kind: String,
    pub text: String,
    /// Stays until `feedback_acknowledge` is called.
    pub sticky: bool,
}

/// Form draft as shown back to the UI; the secret itself never leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub email: String,
    pub extra: String,
    pub has_secret: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    pub matched: bool,
    pub unlocked: bool,
    pub locked_out: bool,
    pub notice: Option<FeedbackItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountItem {
    pub id: String,
    pub name: String,
    pub email: String,
    pub extra: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub time_ms: i64,
    pub payload: AccountItem,
}

/// Reviewer panel envelope; empty and `visible = false` while locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelResponse {
    pub visible: bool,
    pub accounts: Vec<AccountItem>,
    pub notifications: Vec<NotificationItem>,
    pub message: String,
}

/// Submits a registration.
///
/// The lock is released while the secret is hashed; a concurrent submit
/// during that window is refused by the desk's in-flight guard.
#[flutter_rust_bridge::frb(sync)]
pub fn signup_submit(
    name: String,
    email: String,
    password: String,
    extra: String,
) -> SubmitResponse {
    let form = SignupForm::new(name, email, password, extra);
    let pending = match with_desk(|desk| desk.begin_submission(form)) {
        Ok(Ok(pending)) => pending,
        Ok(Err(err)) => return submit_failure(&err),
        Err(err) => return SubmitResponse::failure(err),
    };

    let digest = Sha256Deriver.derive(pending.secret());

    match with_desk(|desk| desk.complete_submission(pending, digest)) {
        Ok(Ok(receipt)) => SubmitResponse {
            ok: true,
            account_id: Some(receipt.account_id.to_string()),
            persisted: receipt.persisted,
            message: SUCCESS_TEXT.to_string(),
        },
        Ok(Err(err)) => submit_failure(&err),
        Err(err) => SubmitResponse::failure(err),
    }
}

/// Current form draft.
#[flutter_rust_bridge::frb(sync)]
pub fn signup_form_state() -> Option<FormState> {
    with_desk(|desk| {
        let form = desk.form();
        FormState {
            name: form.name.clone(),
            email: form.email.clone(),
            extra: form.extra.clone(),
            has_secret: !form.secret.is_empty(),
        }
    })
    .ok()
}

/// Live submit feedback, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn feedback_current() -> Option<FeedbackItem> {
    with_desk(|desk| desk.feedback().map(to_feedback_item))
        .ok()
        .flatten()
}

/// Dismisses the current feedback; returns whether one was shown.
#[flutter_rust_bridge::frb(sync)]
pub fn feedback_acknowledge() -> bool {
    with_desk(|desk| desk.acknowledge_feedback()).unwrap_or(false)
}

/// Tries the reviewer access code.
#[flutter_rust_bridge::frb(sync)]
pub fn gate_attempt(code: String) -> GateResponse {
    with_desk(|desk| {
        let outcome = desk.attempt_gate_outcome(code.as_str());
        GateResponse {
            matched: outcome.is_match(),
            unlocked: desk.gate_unlocked(),
            locked_out: outcome == GateOutcome::LockedOut,
            notice: desk.gate_notice().map(to_feedback_item),
        }
    })
    .unwrap_or(GateResponse {
        matched: false,
        unlocked: false,
        locked_out: false,
        notice: None,
    })
}

/// Gate state plus any live notice, without attempting.
#[flutter_rust_bridge::frb(sync)]
pub fn gate_status() -> GateResponse {
    with_desk(|desk| GateResponse {
        matched: false,
        unlocked: desk.gate_unlocked(),
        locked_out: false,
        notice: desk.gate_notice().map(to_feedback_item),
    })
    .unwrap_or(GateResponse {
        matched: false,
        unlocked: false,
        locked_out: false,
        notice: None,
    })
}

/// Reviewer panel snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn reviewer_panel() -> PanelResponse {
    match with_desk(|desk| desk.reviewer_panel()) {
        Ok(Some(panel)) => PanelResponse {
            visible: true,
            accounts: panel.accounts.iter().map(to_account_item).collect(),
            notifications: panel
                .notifications
                .iter()
                .map(to_notification_item)
                .collect(),
            message: String::new(),
        },
        Ok(None) => hidden_panel("Enter the access code to view the reviewer panel."),
        Err(err) => hidden_panel(err),
    }
}

/// Clears every notification.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_clear() -> ActionResponse {
    match with_desk(|desk| desk.clear_notifications()) {
        Ok(cleared) => ActionResponse::success(format!("Cleared {cleared} notification(s)."), None),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Removes one account; its notification stays in the feed.
#[flutter_rust_bridge::frb(sync)]
pub fn account_remove(id: String) -> ActionResponse {
    let Some(account_id) = parse_account_id(id.as_str()) else {
        return ActionResponse::failure(format!("invalid account id: `{}`", id.trim()));
    };
    match with_desk(|desk| desk.remove_account(account_id)) {
        Ok(true) => ActionResponse::success("Account removed.", Some(account_id.to_string())),
        Ok(false) => ActionResponse::failure("Account not found."),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Copyable JSON of an account's non-credential fields.
#[flutter_rust_bridge::frb(sync)]
pub fn account_export(id: String) -> Option<String> {
    let account_id = parse_account_id(id.as_str())?;
    with_desk(|desk| desk.export_account(account_id))
        .ok()
        .flatten()
}

fn open_desk(path: &Path, config: DeskConfig) -> Result<FfiDesk, String> {
    let conn = open_db(path).map_err(|err| format!("desk DB open failed: {err}"))?;
    let store =
        SqliteKvStore::try_new(conn).map_err(|err| format!("desk store init failed: {err}"))?;
    Ok(SignupDesk::open(store, config))
}

fn lock_slot() -> std::sync::MutexGuard<'static, Option<DeskSlot>> {
    DESK.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_desk<T>(f: impl FnOnce(&mut FfiDesk) -> T) -> Result<T, String> {
    let mut slot = lock_slot();
    if slot.is_none() {
        let path = resolve_db_path();
        let desk = open_desk(&path, DeskConfig::from_env())?;
        *slot = Some(DeskSlot {
            db_path: path,
            desk,
        });
    }
    match slot.as_mut() {
        Some(slot) => Ok(f(&mut slot.desk)),
        None => Err("desk is not initialized".to_string()),
    }
}

fn submit_failure(err: &SubmitError) -> SubmitResponse {
    SubmitResponse::failure(match err {
        SubmitError::Validation(_) => MISSING_FIELD_TEXT,
        SubmitError::CryptoUnavailable(_) => CRYPTO_UNAVAILABLE_TEXT,
        SubmitError::SubmissionInFlight | SubmitError::StaleSubmission => IN_FLIGHT_TEXT,
    })
}

fn hidden_panel(message: impl Into<String>) -> PanelResponse {
    PanelResponse {
        visible: false,
        accounts: Vec::new(),
        notifications: Vec::new(),
        message: message.into(),
    }
}

fn parse_account_id(raw: &str) -> Option<AccountId> {
    AccountId::parse_str(raw.trim()).ok()
}

fn to_feedback_item(message: &FeedbackMessage) -> FeedbackItem {
    FeedbackItem {
        kind: match message.kind {
            FeedbackKind::Success => "success",
            FeedbackKind::Error => "error",
        }
        .to_string(),
        text: message.text.clone(),
        sticky: message.is_sticky(),
    }
}

fn to_account_item(summary: &AccountSummary) -> AccountItem {
    AccountItem {
        id: summary.id.to_string(),
        name: summary.name.clone(),
        email: summary.email.clone(),
        extra: summary.extra.clone(),
        created_at_ms: summary.created_at,
    }
}

fn to_notification_item(notification: &Notification) -> NotificationItem {
    NotificationItem {
        id: notification.id.to_string(),
        title: notification.title.clone(),
        time_ms: notification.time,
        payload: to_account_item(&notification.payload),
    }
}
