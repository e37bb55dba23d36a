//! Account registry.
//!
//! # Responsibility
//! - Own the in-memory account list, most-recent-first.
//! - Serve credential-free views and exports.
//!
//! # Invariants
//! - Full `Account` records only leave this module toward persistence.
//! - Removing an account never touches the notification feed.

use crate::model::account::{Account, AccountExport, AccountId, AccountSummary};

#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
}

impl AccountRegistry {
    /// Restores a registry from persisted records, keeping their order.
    pub fn from_records(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.iter().any(|account| account.id() == id)
    }

    /// Credential-free views, most-recent-first.
    pub fn views(&self) -> Vec<AccountSummary> {
        self.accounts.iter().map(Account::summary).collect()
    }

    pub fn export(&self, id: AccountId) -> Option<AccountExport> {
        self.find(id).map(Account::export)
    }

    pub(crate) fn prepend(&mut self, account: Account) {
        self.accounts.insert(0, account);
    }

    /// Removes the account with `id`; returns whether one was removed.
    pub(crate) fn remove(&mut self, id: AccountId) -> bool {
        let before = self.accounts.len();
        self.accounts.retain(|account| account.id() != id);
        self.accounts.len() != before
    }

    /// Full records for write-through persistence.
    pub(crate) fn records(&self) -> &[Account] {
        &self.accounts
    }

    fn find(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id() == id)
    }
}
