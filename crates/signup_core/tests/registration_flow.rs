use signup_core::db::open_db_in_memory;
use signup_core::{
    CollectionKey, CredentialDeriver, CredentialDigest, CredentialError, DeskConfig,
    FeedbackKind, FormField, KvStore, ManualClock, Sha256Deriver, SignupDesk, SignupForm,
    SqliteKvStore, SubmitError, ValidationError,
};
use std::sync::Arc;

const GATE_SECRET: &str = "goldaccess123";
const START_MS: i64 = 1_700_000_000_000;

type TestDesk = SignupDesk<SqliteKvStore, Sha256Deriver, Arc<ManualClock>>;

fn desk() -> (TestDesk, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MS));
    let store = SqliteKvStore::try_new(open_db_in_memory().unwrap()).unwrap();
    let desk = SignupDesk::open_with(
        store,
        DeskConfig::with_gate_secret(GATE_SECRET),
        Sha256Deriver,
        Arc::clone(&clock),
    );
    (desk, clock)
}

fn stored_json(desk: &TestDesk, key: CollectionKey) -> serde_json::Value {
    let raw = desk
        .repository()
        .store()
        .get(key.as_str())
        .unwrap()
        .expect("collection should be persisted");
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn valid_submission_creates_account_notification_and_success_feedback() {
    let (mut desk, _clock) = desk();

    let receipt = desk
        .submit(SignupForm::new("Ada", "ada@x.com", "s3cret", ""))
        .unwrap();
    assert!(receipt.persisted);
    assert_eq!(desk.account_count(), 1);
    assert_eq!(desk.notification_count(), 1);

    let accounts = stored_json(&desk, CollectionKey::Accounts);
    let derivative = accounts[0]["credential_derivative"].as_str().unwrap();
    assert_eq!(derivative.len(), 64);
    assert!(derivative
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    assert_ne!(derivative, "s3cret");

    let notifications = stored_json(&desk, CollectionKey::Notifications);
    let payload = &notifications[0]["payload"];
    assert_eq!(payload["name"], "Ada");
    assert_eq!(payload["email"], "ada@x.com");
    assert_eq!(payload["extra"], "");
    assert_eq!(payload["created_at"], START_MS);
    assert_eq!(
        notifications[0]["id"],
        format!("n_{}", receipt.account_id)
    );

    let feedback = desk.feedback().unwrap();
    assert_eq!(feedback.kind, FeedbackKind::Success);
    assert_eq!(feedback.text, "Signed up successfully");
    assert!(desk.form().is_empty());
}

#[test]
fn notification_payload_is_account_fields_minus_credential() {
    let (mut desk, _clock) = desk();
    desk.submit(SignupForm::new("Ada", "ada@x.com", "s3cret", "team blue"))
        .unwrap();

    let account = stored_json(&desk, CollectionKey::Accounts)[0].clone();
    let notification = stored_json(&desk, CollectionKey::Notifications)[0].clone();
    let payload = notification["payload"].as_object().unwrap();
    let account = account.as_object().unwrap();

    assert!(!payload.contains_key("credential_derivative"));
    assert_eq!(payload.len(), account.len() - 1);
    for (field, value) in payload {
        assert_eq!(account.get(field), Some(value), "field {field} differs");
    }

    let raw_feed = desk
        .repository()
        .store()
        .get("notifications")
        .unwrap()
        .unwrap();
    let derivative = account["credential_derivative"].as_str().unwrap();
    assert!(!raw_feed.contains(derivative));
}

#[test]
fn missing_name_creates_nothing_and_keeps_form() {
    let (mut desk, _clock) = desk();

    let err = desk
        .submit(SignupForm::new("", "a@b.com", "x", ""))
        .unwrap_err();
    assert_eq!(
        err,
        SubmitError::Validation(ValidationError::MissingField(vec![FormField::Name]))
    );
    assert_eq!(desk.account_count(), 0);
    assert_eq!(desk.notification_count(), 0);

    let feedback = desk.feedback().unwrap();
    assert_eq!(feedback.kind, FeedbackKind::Error);
    assert_eq!(feedback.text, "Please fill name, email and password.");
    assert_eq!(desk.form().email, "a@b.com");
    assert!(!desk.submission_in_flight());
}

#[test]
fn whitespace_only_fields_are_rejected() {
    let (mut desk, _clock) = desk();
    let err = desk
        .submit(SignupForm::new("Ada", "   ", "\t", ""))
        .unwrap_err();
    assert_eq!(
        err,
        SubmitError::Validation(ValidationError::MissingField(vec![
            FormField::Email,
            FormField::Secret
        ]))
    );
    assert_eq!(desk.account_count(), 0);
}

#[test]
fn counts_move_together_across_mixed_submissions() {
    let (mut desk, clock) = desk();
    let inputs = [
        ("Ada", "ada@x.com", "s3cret"),
        ("", "nobody@x.com", "pw"),
        ("Grace", "grace@x.com", "hopper"),
        ("Linus", "", "pw"),
        ("Ken", "ken@x.com", "unix"),
    ];

    for (name, email, secret) in inputs {
        let before = (desk.account_count(), desk.notification_count());
        let result = desk.submit(SignupForm::new(name, email, secret, ""));
        let after = (desk.account_count(), desk.notification_count());
        match result {
            Ok(_) => assert_eq!(after, (before.0 + 1, before.1 + 1)),
            Err(_) => assert_eq!(after, before),
        }
        clock.advance(10);
    }
    assert_eq!(desk.account_count(), 3);
}

#[test]
fn newest_submission_is_listed_first() {
    let (mut desk, clock) = desk();
    desk.submit(SignupForm::new("Ada", "ada@x.com", "a", ""))
        .unwrap();
    clock.advance(1_000);
    desk.submit(SignupForm::new("Grace", "grace@x.com", "g", ""))
        .unwrap();

    assert!(desk.attempt_gate(GATE_SECRET));
    let panel = desk.reviewer_panel().unwrap();
    assert_eq!(panel.accounts[0].name, "Grace");
    assert_eq!(panel.accounts[1].name, "Ada");
    assert_eq!(panel.notifications[0].payload.name, "Grace");
    assert_eq!(panel.notifications[0].time, START_MS + 1_000);
}

#[test]
fn submit_form_uses_draft_fields() {
    let (mut desk, _clock) = desk();
    desk.set_form_field(FormField::Name, "Ada");
    desk.set_form_field(FormField::Email, "ada@x.com");
    desk.set_form_field(FormField::Secret, "s3cret");

    desk.submit_form().unwrap();
    assert_eq!(desk.account_count(), 1);
    assert!(desk.form().is_empty());
}

#[test]
fn success_feedback_expires_and_is_superseded() {
    let (mut desk, clock) = desk();
    let ttl_ms = desk.config().feedback_ttl.as_millis() as i64;

    desk.submit(SignupForm::new("", "", "", "")).unwrap_err();
    clock.advance(ttl_ms / 2);
    desk.submit(SignupForm::new("Ada", "ada@x.com", "s3cret", ""))
        .unwrap();
    assert_eq!(desk.feedback().unwrap().kind, FeedbackKind::Success);

    // Past the first message's deadline, the second one still shows.
    clock.advance(ttl_ms / 2 + 1);
    assert_eq!(desk.feedback().unwrap().kind, FeedbackKind::Success);

    clock.advance(ttl_ms);
    assert!(desk.feedback().is_none());
}

#[test]
fn second_begin_is_refused_while_derivation_is_outstanding() {
    let (mut desk, _clock) = desk();

    let pending = desk
        .begin_submission(SignupForm::new("Ada", "ada@x.com", "s3cret", ""))
        .unwrap();
    assert!(desk.submission_in_flight());

    let err = desk
        .submit(SignupForm::new("Ada", "ada@x.com", "s3cret", ""))
        .unwrap_err();
    assert_eq!(err, SubmitError::SubmissionInFlight);
    assert_eq!(desk.account_count(), 0);

    let digest = Sha256Deriver.derive(pending.secret());
    desk.complete_submission(pending, digest).unwrap();
    assert!(!desk.submission_in_flight());
    assert_eq!(desk.account_count(), 1);
    assert_eq!(desk.notification_count(), 1);
}

#[test]
fn refused_submission_keeps_its_draft_after_first_completes() {
    let (mut desk, _clock) = desk();

    let pending = desk
        .begin_submission(SignupForm::new("Ada", "ada@x.com", "s3cret", ""))
        .unwrap();
    let err = desk
        .begin_submission(SignupForm::new("Grace", "grace@x.com", "hopper", ""))
        .unwrap_err();
    assert_eq!(err, SubmitError::SubmissionInFlight);
    assert_eq!(desk.form().name, "Grace");

    let digest = Sha256Deriver.derive(pending.secret());
    desk.complete_submission(pending, digest).unwrap();
    assert_eq!(desk.account_count(), 1);
    assert_eq!(desk.form().name, "Grace");
    assert_eq!(desk.form().email, "grace@x.com");
    assert_eq!(desk.feedback().unwrap().text, "Signed up successfully");

    desk.submit_form().unwrap();
    assert_eq!(desk.account_count(), 2);
    assert!(desk.form().is_empty());
}

struct UnavailableDeriver;

impl CredentialDeriver for UnavailableDeriver {
    fn derive(&self, _secret: &str) -> Result<CredentialDigest, CredentialError> {
        Err(CredentialError::CryptoUnavailable(
            "digest backend missing".to_string(),
        ))
    }
}

#[test]
fn crypto_unavailable_blocks_submission_with_sticky_error() {
    let clock = Arc::new(ManualClock::new(START_MS));
    let store = SqliteKvStore::try_new(open_db_in_memory().unwrap()).unwrap();
    let mut desk = SignupDesk::open_with(
        store,
        DeskConfig::with_gate_secret(GATE_SECRET),
        UnavailableDeriver,
        Arc::clone(&clock),
    );

    let err = desk
        .submit(SignupForm::new("Ada", "ada@x.com", "s3cret", ""))
        .unwrap_err();
    assert!(matches!(err, SubmitError::CryptoUnavailable(_)));
    assert_eq!(desk.account_count(), 0);
    assert_eq!(desk.notification_count(), 0);
    assert!(!desk.submission_in_flight());
    assert_eq!(desk.form().name, "Ada");

    clock.advance(60 * 60 * 1_000);
    let feedback = desk.feedback().expect("sticky error should remain");
    assert_eq!(feedback.kind, FeedbackKind::Error);
    assert!(feedback.is_sticky());

    assert!(desk.acknowledge_feedback());
    assert!(desk.feedback().is_none());
}
