//! Trading accounts.
//!
//! An account is a named holder of a multi-asset balance. The negativity
//! invariant lives here: applying a delta that would leave any asset below
//! zero is rejected and the balance stays untouched.

use crate::balance::Balance;
use crate::types::{AccountId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub balance: Balance,
    pub created_at: Timestamp,
}

impl Account {
    pub fn new(id: AccountId, name: impl Into<String>, balance: Balance, now: Timestamp) -> Self {
        Self {
            id,
            name: name.into(),
            balance,
            created_at: now,
        }
    }

    /// Apply a settlement delta. All-or-nothing: on overdraw the balance is
    /// left exactly as it was.
    pub fn apply_delta(&mut self, delta: Balance) -> Result<(), AccountError> {
        let next = self.balance.clone() + delta;
        if next.any_negative() {
            return Err(AccountError::InsufficientBalance { account: self.id });
        }
        self.balance = next;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccountError {
    #[error("account {account:?} has insufficient balance for this operation")]
    InsufficientBalance { account: AccountId },
}
