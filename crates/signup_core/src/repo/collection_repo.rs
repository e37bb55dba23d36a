//! Typed JSON collections over the key-value store.
//!
//! # Responsibility
//! - Load and save whole ordered collections under fixed keys.
//! - Reject malformed stored data instead of masking it.
//!
//! # Invariants
//! - A key that was never written loads as an empty collection.
//! - `save` always writes the full collection (write-through, no diffs).
//! - Order is preserved exactly across save/load.

use crate::model::account::{Account, AccountValidationError};
use crate::model::notification::Notification;
use crate::repo::kv_repo::{KvStore, RepoError};
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed storage keys for the persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Accounts,
    Notifications,
}

impl CollectionKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Notifications => "notifications",
        }
    }
}

impl Display for CollectionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection-level persistence error.
#[derive(Debug)]
pub enum PersistError {
    /// Underlying key-value store failure.
    Repo(RepoError),
    /// Stored data could not be decoded or violates record invariants.
    Corrupt { key: CollectionKey, message: String },
    /// In-memory data could not be encoded.
    Encode { key: CollectionKey, message: String },
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Corrupt { key, message } => {
                write!(f, "persisted collection `{key}` is corrupt: {message}")
            }
            Self::Encode { key, message } => {
                write!(f, "failed to encode collection `{key}`: {message}")
            }
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PersistError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Persistence adapter for the account and notification collections.
pub struct CollectionRepository<S: KvStore> {
    store: S,
}

impl<S: KvStore> CollectionRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads one collection; an absent key yields an empty vector.
    pub fn load<T: DeserializeOwned>(&self, key: CollectionKey) -> Result<Vec<T>, PersistError> {
        let Some(raw) = self.store.get(key.as_str())? else {
            debug!(
                "event=collection_load module=repo status=empty key={}",
                key.as_str()
            );
            return Ok(Vec::new());
        };

        let items = serde_json::from_str::<Vec<T>>(raw.as_str()).map_err(|err| {
            PersistError::Corrupt {
                key,
                message: err.to_string(),
            }
        })?;
        debug!(
            "event=collection_load module=repo status=ok key={} count={}",
            key.as_str(),
            items.len()
        );
        Ok(items)
    }

    /// Replaces the stored collection with `items`.
    pub fn save<T: Serialize>(&self, key: CollectionKey, items: &[T]) -> Result<(), PersistError> {
        let encoded = serde_json::to_string(items).map_err(|err| PersistError::Encode {
            key,
            message: err.to_string(),
        })?;
        if let Err(err) = self.store.put(key.as_str(), encoded.as_str()) {
            error!(
                "event=collection_save module=repo status=error key={} error={}",
                key.as_str(),
                err
            );
            return Err(err.into());
        }
        debug!(
            "event=collection_save module=repo status=ok key={} count={}",
            key.as_str(),
            items.len()
        );
        Ok(())
    }

    /// Loads accounts and checks every record's invariants.
    pub fn load_accounts(&self) -> Result<Vec<Account>, PersistError> {
        let accounts = self.load::<Account>(CollectionKey::Accounts)?;
        for (index, account) in accounts.iter().enumerate() {
            account
                .validate()
                .map_err(|err: AccountValidationError| PersistError::Corrupt {
                    key: CollectionKey::Accounts,
                    message: format!("record {index}: {err}"),
                })?;
        }
        Ok(accounts)
    }

    /// Loads notifications and checks id/payload correlation.
    pub fn load_notifications(&self) -> Result<Vec<Notification>, PersistError> {
        let notifications = self.load::<Notification>(CollectionKey::Notifications)?;
        if let Some(index) = notifications.iter().position(|item| !item.is_correlated()) {
            return Err(PersistError::Corrupt {
                key: CollectionKey::Notifications,
                message: format!("record {index}: id does not match payload account id"),
            });
        }
        Ok(notifications)
    }

    pub fn save_accounts(&self, accounts: &[Account]) -> Result<(), PersistError> {
        self.save(CollectionKey::Accounts, accounts)
    }

    pub fn save_notifications(&self, notifications: &[Notification]) -> Result<(), PersistError> {
        self.save(CollectionKey::Notifications, notifications)
    }
}
