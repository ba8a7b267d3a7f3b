//! In-memory ledger implementing both collaborator contracts
//!
//! Used as the native ledger, the quote ledger and the share ledger of the
//! simulated pool. Balances and allowances live in ordered maps so the
//! serialized form is stable between runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::{AccountId, ShareLedger, TokenLedger};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBook {
    total_supply: u128,
    balances: BTreeMap<AccountId, u128>,
    /// owner -> spender -> remaining allowance
    #[serde(default)]
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, u128>>,
}

impl TokenBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Accounts with a non-zero balance, in order
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, u128)> {
        self.balances
            .iter()
            .filter(|(_, &balance)| balance > 0)
            .map(|(account, &balance)| (account, balance))
    }

    /// Create `amount` new units in `account`
    pub fn mint(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.total_supply = supply;
        self.set_balance(account, balance);
        Ok(())
    }

    /// Destroy `amount` units held by `account`
    pub fn burn(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let available = self.balance(account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: account.clone(),
                needed: amount,
                available,
            });
        }

        let supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;

        self.set_balance(account, available - amount);
        self.total_supply = supply;
        Ok(())
    }

    fn set_allowance(&mut self, owner: &AccountId, spender: &AccountId, amount: u128) {
        let entry = self.allowances.entry(owner.clone()).or_default();
        if amount == 0 {
            entry.remove(spender);
        } else {
            entry.insert(spender.clone(), amount);
        }
        if entry.is_empty() {
            self.allowances.remove(owner);
        }
    }

    fn balance(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn set_balance(&mut self, account: &AccountId, balance: u128) {
        if balance == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), balance);
        }
    }

    fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let available = self.balance(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.clone(),
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.set_balance(from, available - amount);
        self.set_balance(to, credited);
        Ok(())
    }
}

impl TokenLedger for TokenBook {
    fn balance_of(&self, account: &AccountId) -> u128 {
        self.balance(account)
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.move_balance(from, to, amount)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.set_allowance(owner, spender, amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                needed: amount,
                available: allowed,
            });
        }

        self.move_balance(from, to, amount)?;
        self.set_allowance(from, spender, allowed - amount);
        Ok(())
    }
}

impl ShareLedger for TokenBook {
    fn total_shares(&self) -> u128 {
        self.total_supply
    }

    fn shares_of(&self, account: &AccountId) -> u128 {
        self.balance(account)
    }

    fn mint_shares(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        self.mint(account, amount)
    }

    fn burn_shares(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        self.burn(account, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> AccountId {
        AccountId::new(name)
    }

    #[test]
    fn test_mint_and_burn_track_supply() {
        let mut book = TokenBook::new();
        book.mint(&id("alice"), 1000).unwrap();
        book.mint(&id("bob"), 500).unwrap();
        assert_eq!(book.total_supply(), 1500);

        book.burn(&id("alice"), 400).unwrap();
        assert_eq!(book.balance_of(&id("alice")), 600);
        assert_eq!(book.total_supply(), 1100);
    }

    #[test]
    fn test_burn_more_than_held_rejected() {
        let mut book = TokenBook::new();
        book.mint(&id("alice"), 10).unwrap();

        let err = book.burn(&id("alice"), 11).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: id("alice"),
                needed: 11,
                available: 10,
            }
        );
        assert_eq!(book.total_supply(), 10);
    }

    #[test]
    fn test_burn_beyond_recorded_supply_rejected() {
        // Balances summing past total_supply, as in a hand-edited state file
        let mut book: TokenBook = serde_json::from_str(
            r#"{"total_supply": 5, "balances": {"alice": 10}}"#,
        )
        .unwrap();
        let before = book.clone();

        assert_eq!(book.burn(&id("alice"), 8), Err(LedgerError::Overflow));
        assert_eq!(book, before);
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut book = TokenBook::new();
        book.mint(&id("alice"), 100).unwrap();
        book.transfer(&id("alice"), &id("bob"), 30).unwrap();

        assert_eq!(book.balance_of(&id("alice")), 70);
        assert_eq!(book.balance_of(&id("bob")), 30);
        assert_eq!(book.total_supply(), 100);
    }

    #[test]
    fn test_transfer_insufficient_balance_no_effect() {
        let mut book = TokenBook::new();
        book.mint(&id("alice"), 100).unwrap();
        let before = book.clone();

        assert!(book.transfer(&id("alice"), &id("bob"), 101).is_err());
        assert_eq!(book, before);
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let mut book = TokenBook::new();
        book.mint(&id("alice"), 100).unwrap();

        let err = book
            .transfer_from(&id("pool"), &id("alice"), &id("pool"), 50)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { available: 0, .. }));

        book.approve(&id("alice"), &id("pool"), 80).unwrap();
        book.transfer_from(&id("pool"), &id("alice"), &id("pool"), 50)
            .unwrap();
        assert_eq!(book.balance_of(&id("pool")), 50);
        assert_eq!(book.allowance(&id("alice"), &id("pool")), 30);
    }

    #[test]
    fn test_transfer_from_short_balance_keeps_allowance() {
        let mut book = TokenBook::new();
        book.mint(&id("alice"), 10).unwrap();
        book.approve(&id("alice"), &id("pool"), 50).unwrap();

        assert!(book
            .transfer_from(&id("pool"), &id("alice"), &id("pool"), 20)
            .is_err());
        assert_eq!(book.allowance(&id("alice"), &id("pool")), 50);
    }

    #[test]
    fn test_share_ledger_view() {
        let mut book = TokenBook::new();
        book.mint_shares(&id("lp"), 1000).unwrap();
        assert_eq!(book.total_shares(), 1000);
        assert_eq!(book.shares_of(&id("lp")), 1000);

        book.burn_shares(&id("lp"), 1000).unwrap();
        assert_eq!(book.total_shares(), 0);
        assert_eq!(book.accounts().count(), 0);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut book = TokenBook::new();
        book.mint(&id("alice"), 42).unwrap();
        book.approve(&id("alice"), &id("pool"), 7).unwrap();

        let json = serde_json::to_string(&book).unwrap();
        let back: TokenBook = serde_json::from_str(&json).unwrap();
        assert_eq!(back, book);
    }
}
