//! Collaborator contracts
//!
//! The pool never keeps balances of its own. Reserves and share supply are
//! read from these ledgers at call time, and every movement of value goes
//! through them. Hosts provide implementations; [`TokenBook`](crate::TokenBook)
//! is the in-memory one used by tests and the CLI.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Identity of an account in the host environment
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AccountId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Fungible asset transfer service
///
/// Implementations must either apply a call fully or reject it with no effect.
pub trait TokenLedger {
    /// Current balance of `account`
    fn balance_of(&self, account: &AccountId) -> u128;

    /// Move `amount` from `from` to `to` on `from`'s own authority
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u128)
        -> Result<(), LedgerError>;

    /// Amount `spender` may still move out of `owner`'s balance
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128;

    /// Set `spender`'s allowance over `owner`'s balance, replacing any previous value
    fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to` using `spender`'s allowance over `from`
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError>;
}

/// Ownership share ledger
pub trait ShareLedger {
    /// Outstanding share count
    fn total_shares(&self) -> u128;

    /// Shares held by `account`
    fn shares_of(&self, account: &AccountId) -> u128;

    fn mint_shares(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError>;

    /// Fails with [`LedgerError::InsufficientBalance`] if `account` holds fewer than `amount`
    fn burn_shares(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError>;
}
