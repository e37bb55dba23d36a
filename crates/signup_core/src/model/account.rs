//! Account domain model.
//!
//! # Responsibility
//! - Define the persisted account record and its outbound projections.
//! - Keep the credential derivative sealed inside the record.
//!
//! # Invariants
//! - `credential_derivative` has no public accessor; outbound shapes
//!   (`AccountSummary`, `AccountExport`) are built fresh and carry no
//!   credential field.
//! - Accounts are never mutated after creation.

use crate::credential::CredentialDigest;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

/// Stable identifier of an account (UUID v7, time-ordered).
pub type AccountId = Uuid;

/// Validation failures for account records loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    NilId,
    BlankName,
    BlankEmail,
    MalformedDerivative,
}

impl Display for AccountValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "account id must not be nil"),
            Self::BlankName => write!(f, "account name must not be blank"),
            Self::BlankEmail => write!(f, "account email must not be blank"),
            Self::MalformedDerivative => {
                write!(f, "credential derivative must be 64 lowercase hex chars")
            }
        }
    }
}

impl Error for AccountValidationError {}

/// Persisted account record.
///
/// Serialized in full (derivative included) only for at-rest storage under the
/// `accounts` key. `Debug` omits the derivative.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    name: String,
    email: String,
    extra: String,
    /// Unix epoch milliseconds.
    created_at: i64,
    credential_derivative: String,
}

impl Account {
    pub(crate) fn new(
        id: AccountId,
        name: impl Into<String>,
        email: impl Into<String>,
        extra: impl Into<String>,
        created_at: i64,
        derivative: CredentialDigest,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            extra: extra.into(),
            created_at,
            credential_derivative: derivative.into_inner(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn extra(&self) -> &str {
        self.extra.as_str()
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Checks structural invariants of a record read back from storage.
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.id.is_nil() {
            return Err(AccountValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::BlankName);
        }
        if self.email.trim().is_empty() {
            return Err(AccountValidationError::BlankEmail);
        }
        if CredentialDigest::from_hex(self.credential_derivative.as_str()).is_none() {
            return Err(AccountValidationError::MalformedDerivative);
        }
        Ok(())
    }

    /// Builds the credential-free summary used for views and notifications.
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            extra: self.extra.clone(),
            created_at: self.created_at,
        }
    }

    /// Builds the copyable export shape.
    pub fn export(&self) -> AccountExport {
        AccountExport {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            extra: self.extra.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn derivative_for_test(&self) -> &str {
        self.credential_derivative.as_str()
    }
}

impl Debug for Account {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Credential-free projection of an account.
///
/// Shared by reviewer views and notification payloads. There is no credential
/// field to strip: the type cannot carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub extra: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Non-credential fields offered for clipboard export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountExport {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub extra: String,
}
