use signup_core::db::open_db;
use signup_core::{
    CollectionKey, DeskConfig, KvStore, ManualClock, RepoError, RepoResult, Sha256Deriver,
    SignupDesk, SignupForm, SqliteKvStore,
};
use std::path::Path;
use std::sync::Arc;

const GATE_SECRET: &str = "goldaccess123";

fn open_desk(path: &Path) -> SignupDesk<SqliteKvStore, Sha256Deriver, Arc<ManualClock>> {
    let store = SqliteKvStore::try_new(open_db(path).unwrap()).unwrap();
    SignupDesk::open_with(
        store,
        DeskConfig::with_gate_secret(GATE_SECRET),
        Sha256Deriver,
        Arc::new(ManualClock::new(1_700_000_000_000)),
    )
}

fn seed(path: &Path) {
    let mut desk = open_desk(path);
    for (name, email) in [
        ("Ada", "ada@x.com"),
        ("Grace", "grace@x.com"),
        ("Ken", "ken@x.com"),
    ] {
        desk.submit(SignupForm::new(name, email, "pw", "")).unwrap();
    }
}

#[test]
fn reload_yields_equal_collections_in_same_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signup.db");

    let (accounts_before, notifications_before, stored_before) = {
        let mut desk = open_desk(&path);
        for (name, email) in [("Ada", "ada@x.com"), ("Grace", "grace@x.com")] {
            desk.submit(SignupForm::new(name, email, "pw", "x")).unwrap();
        }
        desk.attempt_gate(GATE_SECRET);
        let panel = desk.reviewer_panel().unwrap();
        (panel.accounts, panel.notifications, stored_accounts(&desk))
    };

    let mut reopened = open_desk(&path);
    assert!(reopened.startup_report().reset_collections.is_empty());
    assert_eq!(reopened.startup_report().accounts_loaded, 2);
    reopened.attempt_gate(GATE_SECRET);
    let panel = reopened.reviewer_panel().unwrap();
    assert_eq!(panel.accounts, accounts_before);
    assert_eq!(panel.notifications, notifications_before);

    // Rewriting the loaded records must keep every stored field, including
    // the credential derivative.
    reopened
        .submit(SignupForm::new("Ken", "ken@x.com", "pw", ""))
        .unwrap();
    let stored_after = stored_accounts(&reopened);
    let after = stored_after.as_array().unwrap();
    assert_eq!(after.len(), 3);
    assert_eq!(&after[1..], stored_before.as_array().unwrap().as_slice());
    assert!(after[1..]
        .iter()
        .all(|account| account["credential_derivative"].as_str().unwrap().len() == 64));
}

fn stored_accounts(
    desk: &SignupDesk<SqliteKvStore, Sha256Deriver, Arc<ManualClock>>,
) -> serde_json::Value {
    let raw = desk
        .repository()
        .store()
        .get(CollectionKey::Accounts.as_str())
        .unwrap()
        .unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn gate_state_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signup.db");
    {
        let mut desk = open_desk(&path);
        desk.attempt_gate(GATE_SECRET);
    }
    let reopened = open_desk(&path);
    assert!(!reopened.gate_unlocked());
}

#[test]
fn remove_account_keeps_all_notifications() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signup.db");
    seed(&path);

    let mut desk = open_desk(&path);
    desk.attempt_gate(GATE_SECRET);
    let panel = desk.reviewer_panel().unwrap();
    let target = panel.accounts[1].id;

    assert!(desk.remove_account(target));
    assert!(!desk.remove_account(target));

    let after = desk.reviewer_panel().unwrap();
    assert_eq!(after.accounts.len(), 2);
    assert!(after.accounts.iter().all(|account| account.id != target));
    assert_eq!(after.notifications, panel.notifications);
    assert!(after
        .notifications
        .iter()
        .any(|notification| notification.payload.id == target));

    let mut reopened = open_desk(&path);
    assert_eq!(reopened.account_count(), 2);
    assert_eq!(reopened.notification_count(), 3);
    reopened.attempt_gate(GATE_SECRET);
    assert_eq!(reopened.reviewer_panel().unwrap().accounts, after.accounts);
}

#[test]
fn clear_notifications_keeps_accounts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signup.db");
    seed(&path);

    let mut desk = open_desk(&path);
    assert_eq!(desk.clear_notifications(), 3);
    assert_eq!(desk.notification_count(), 0);
    assert_eq!(desk.account_count(), 3);

    let stored = desk
        .repository()
        .store()
        .get(CollectionKey::Notifications.as_str())
        .unwrap();
    assert_eq!(stored.as_deref(), Some("[]"));

    let reopened = open_desk(&path);
    assert_eq!(reopened.notification_count(), 0);
    assert_eq!(reopened.account_count(), 3);
}

#[test]
fn corrupt_collection_resets_to_empty_and_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signup.db");
    seed(&path);

    {
        let store = SqliteKvStore::try_new(open_db(&path).unwrap()).unwrap();
        store.put("accounts", "{\"truncated\": ").unwrap();
    }

    let mut desk = open_desk(&path);
    assert_eq!(
        desk.startup_report().reset_collections,
        vec![CollectionKey::Accounts]
    );
    assert_eq!(desk.account_count(), 0);
    assert_eq!(desk.notification_count(), 3);

    desk.submit(SignupForm::new("Ada", "ada@x.com", "pw", ""))
        .unwrap();
    let reopened = open_desk(&path);
    assert!(reopened.startup_report().reset_collections.is_empty());
    assert_eq!(reopened.account_count(), 1);
    assert_eq!(reopened.notification_count(), 4);
}

#[test]
fn tampered_credential_field_counts_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signup.db");
    seed(&path);

    {
        let store = SqliteKvStore::try_new(open_db(&path).unwrap()).unwrap();
        let raw = store.get("accounts").unwrap().unwrap();
        let mut accounts: serde_json::Value = serde_json::from_str(&raw).unwrap();
        accounts[0]["credential_derivative"] = serde_json::json!("pw");
        store.put("accounts", &accounts.to_string()).unwrap();
    }

    let desk = open_desk(&path);
    assert_eq!(
        desk.startup_report().reset_collections,
        vec![CollectionKey::Accounts]
    );
}

/// Store whose writes always fail, for best-effort write-through checks.
struct ReadOnlyStore;

impl KvStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> RepoResult<Option<String>> {
        Ok(None)
    }

    fn put(&self, _key: &str, _value: &str) -> RepoResult<()> {
        Err(RepoError::MissingRequiredTable("kv_store"))
    }

    fn delete(&self, _key: &str) -> RepoResult<bool> {
        Ok(false)
    }
}

#[test]
fn failed_write_through_keeps_memory_state() {
    let mut desk = SignupDesk::open(ReadOnlyStore, DeskConfig::with_gate_secret(GATE_SECRET));

    let receipt = desk
        .submit(SignupForm::new("Ada", "ada@x.com", "pw", ""))
        .unwrap();
    assert!(!receipt.persisted);
    assert_eq!(desk.account_count(), 1);
    assert_eq!(desk.notification_count(), 1);
}
