//! Reviewer notification model.
//!
//! # Responsibility
//! - Define the redacted activity-feed record created for each sign-up.
//!
//! # Invariants
//! - `id` is `n_` followed by the source account id.
//! - `payload` is an `AccountSummary` snapshot taken at creation time.

use crate::model::account::{Account, AccountId, AccountSummary};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const NOTIFICATION_ID_PREFIX: &str = "n_";

/// Identifier correlating a notification with its source account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Derives the notification id for an account.
    pub fn for_account(account_id: AccountId) -> Self {
        Self(format!("{NOTIFICATION_ID_PREFIX}{account_id}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Activity-feed entry shown to reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    /// Unix epoch milliseconds.
    pub time: i64,
    pub payload: AccountSummary,
}

impl Notification {
    /// Projects a new-sign-up notification from an account.
    pub fn sign_up(account: &Account) -> Self {
        Self {
            id: NotificationId::for_account(account.id()),
            title: format!("New sign-up: {}", account.name()),
            time: account.created_at(),
            payload: account.summary(),
        }
    }

    /// Returns whether `id` still matches the prefixing rule for the payload.
    pub fn is_correlated(&self) -> bool {
        self.id == NotificationId::for_account(self.payload.id)
    }
}

#[cfg(test)]
mod tests {
    use super::{Notification, NotificationId};
    use crate::credential::derive_sha256_hex;
    use crate::model::account::Account;
    use uuid::Uuid;

    #[test]
    fn sign_up_notification_correlates_with_account() {
        let account = Account::new(
            Uuid::now_v7(),
            "Ada",
            "ada@x.com",
            "",
            42,
            derive_sha256_hex("s3cret"),
        );
        let notification = Notification::sign_up(&account);

        assert_eq!(notification.id.as_str(), format!("n_{}", account.id()));
        assert!(notification.is_correlated());
        assert_eq!(notification.time, 42);
        assert_eq!(notification.payload, account.summary());
        assert_eq!(notification.title, "New sign-up: Ada");
    }

    #[test]
    fn notification_id_serializes_as_plain_string() {
        let id = NotificationId::for_account(Uuid::nil());
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!(format!("n_{}", Uuid::nil())));
    }
}
