//! Reserve Pool - two-asset constant product liquidity pool
//!
//! This crate implements the accounting and pricing engine of a constant
//! product market maker over a base asset ("native") and a quote asset. It:
//! 1. Issues ownership shares proportional to each provider's relative
//!    contribution to the reserves
//! 2. Prices swaps on the `x·y=k` curve with a 1% input fee
//! 3. Keeps reserves authoritative in external ledgers; nothing is cached
//! 4. Applies every operation atomically: a failure leaves no effect behind
//!
//! Balances are never held by the engine. The native asset, the quote asset
//! and the share supply each live in a collaborator ledger
//! ([`TokenLedger`], [`ShareLedger`]) under the pool's custody account.
//!
//! ⚠️ The first deposit into an empty pool sets the price ratio unilaterally.
//! A seeding depositor can pick any ratio and arbitrage against later
//! depositors who do not check it. This behaviour is kept as is and logged.

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

mod error;
mod ledger;
mod token_book;

pub use amm_model::{price_swap, SwapQuote, FEE_DENOMINATOR, FEE_NUMERATOR};
pub use error::{LedgerError, PoolError, Result};
pub use ledger::{AccountId, ShareLedger, TokenLedger};
pub use token_book::TokenBook;

// ============================================================================
// Core Data Structures
// ============================================================================

/// Reserves and supply read from the collaborators at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub native_reserve: u128,
    pub quote_reserve: u128,
    pub share_supply: u128,
}

impl PoolSnapshot {
    /// `native_reserve * quote_reserve`, `None` on overflow
    pub fn invariant(&self) -> Option<u128> {
        self.native_reserve.checked_mul(self.quote_reserve)
    }
}

/// Constant product pool over a native/quote pair
///
/// Generic over the three collaborator ledgers. All operations take
/// `&mut self`, so a collaborator can never re-enter the pool mid-operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservePool<N, Q, S> {
    /// Account holding the pool's reserves in both token ledgers
    custody: AccountId,

    /// Native asset ledger
    native: N,

    /// Quote asset ledger
    quote: Q,

    /// Ownership share ledger
    shares: S,
}

/// Pool backed entirely by in-memory ledgers
pub type InMemoryPool = ReservePool<TokenBook, TokenBook, TokenBook>;

impl InMemoryPool {
    /// Empty pool with fresh in-memory ledgers
    pub fn in_memory(custody: impl Into<AccountId>) -> Self {
        ReservePool::new(custody, TokenBook::new(), TokenBook::new(), TokenBook::new())
    }
}

// ============================================================================
// Effect Journal
// ============================================================================

/// A collaborator effect that has already been applied
#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    NativeIn { from: AccountId, amount: u128 },
    NativeOut { to: AccountId, amount: u128 },
    QuoteIn {
        from: AccountId,
        amount: u128,
        allowance: u128,
    },
    QuoteOut { to: AccountId, amount: u128 },
    Minted { account: AccountId, amount: u128 },
    Burned { account: AccountId, amount: u128 },
}

/// Effects applied so far by the running operation, in order
#[derive(Debug, Default)]
struct Journal {
    effects: Vec<Effect>,
}

impl Journal {
    fn record(&mut self, effect: Effect) {
        self.effects.push(effect);
    }
}

// ============================================================================
// Queries
// ============================================================================

impl<N, Q, S> ReservePool<N, Q, S>
where
    N: TokenLedger,
    Q: TokenLedger,
    S: ShareLedger,
{
    pub fn new(custody: impl Into<AccountId>, native: N, quote: Q, shares: S) -> Self {
        Self {
            custody: custody.into(),
            native,
            quote,
            shares,
        }
    }

    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    pub fn native_ledger(&self) -> &N {
        &self.native
    }

    /// Host access for crediting balances between operations
    pub fn native_ledger_mut(&mut self) -> &mut N {
        &mut self.native
    }

    pub fn quote_ledger(&self) -> &Q {
        &self.quote
    }

    pub fn quote_ledger_mut(&mut self) -> &mut Q {
        &mut self.quote
    }

    pub fn share_ledger(&self) -> &S {
        &self.shares
    }

    /// Quote asset held by the pool
    pub fn get_reserve(&self) -> u128 {
        self.quote.balance_of(&self.custody)
    }

    /// Native asset held by the pool
    pub fn native_reserve(&self) -> u128 {
        self.native.balance_of(&self.custody)
    }

    pub fn share_supply(&self) -> u128 {
        self.shares.total_shares()
    }

    pub fn shares_of(&self, account: &AccountId) -> u128 {
        self.shares.shares_of(account)
    }

    /// The pool is empty exactly when no shares are outstanding
    pub fn is_empty(&self) -> bool {
        self.share_supply() == 0
    }

    pub fn reserves(&self) -> PoolSnapshot {
        PoolSnapshot {
            native_reserve: self.native_reserve(),
            quote_reserve: self.get_reserve(),
            share_supply: self.share_supply(),
        }
    }

    /// Minimum quote a deposit of `native_amount` must offer
    ///
    /// Zero while the pool is empty: the seeding deposit sets the ratio.
    pub fn required_quote(&self, native_amount: u128) -> Result<u128> {
        if self.is_empty() {
            return Ok(0);
        }
        let native_reserve = self.native_reserve();
        if native_reserve == 0 {
            return Err(PoolError::EmptyPool);
        }
        Ok(amm_model::required_quote(
            native_amount,
            self.get_reserve(),
            native_reserve,
        )?)
    }

    /// Quote received for selling `native_in` at current reserves
    pub fn quote_native_for_quote(&self, native_in: u128) -> Result<u128> {
        if native_in == 0 {
            return Err(PoolError::InvalidAmount("swap input must be positive"));
        }
        Ok(price_swap(native_in, self.native_reserve(), self.get_reserve())?)
    }

    /// Native received for selling `quote_in` at current reserves
    pub fn quote_quote_for_native(&self, quote_in: u128) -> Result<u128> {
        if quote_in == 0 {
            return Err(PoolError::InvalidAmount("swap input must be positive"));
        }
        Ok(price_swap(quote_in, self.get_reserve(), self.native_reserve())?)
    }

    /// `(native, quote)` that burning `shares` would return
    pub fn withdrawal_preview(&self, shares: u128) -> Result<(u128, u128)> {
        if shares == 0 {
            return Err(PoolError::InvalidAmount("shares to burn must be positive"));
        }
        let snapshot = self.reserves();
        if snapshot.share_supply == 0 {
            return Err(PoolError::EmptyPool);
        }
        if shares > snapshot.share_supply {
            return Err(PoolError::InsufficientShares {
                requested: shares,
                available: snapshot.share_supply,
            });
        }
        Ok(amm_model::withdrawal_amounts(
            shares,
            snapshot.native_reserve,
            snapshot.quote_reserve,
            snapshot.share_supply,
        )?)
    }
}

// ============================================================================
// Liquidity Operations
// ============================================================================

impl<N, Q, S> ReservePool<N, Q, S>
where
    N: TokenLedger,
    Q: TokenLedger,
    S: ShareLedger,
{
    /// Deposit `native_amount` and `quote_amount`, minting shares to `caller`
    ///
    /// # Empty pool
    /// Accepts both amounts in full and mints `native_amount` shares. Both
    /// amounts must be positive. The caller sets the price ratio.
    ///
    /// # Funded pool
    /// The prior native reserve is the custody balance before this call's
    /// native is attached (`reserve_after_call - native_amount`).
    /// - `required = native_amount * quote_reserve / prior_native` (truncating)
    /// - `quote_amount >= required`, else `InsufficientQuoteAmount`
    /// - `minted = share_supply * native_amount / prior_native` (truncating)
    ///
    /// The full `quote_amount` is taken even when it exceeds `required`; the
    /// excess is not refunded and earns no extra shares.
    ///
    /// The quote side is pulled with the pool's allowance over `caller`.
    ///
    /// No operation accepts the custody account as caller or recipient: its
    /// transfers would be self-transfers that move no value.
    pub fn add_liquidity(
        &mut self,
        caller: &AccountId,
        native_amount: u128,
        quote_amount: u128,
    ) -> Result<u128> {
        self.check_counterparty(caller)?;

        let supply = self.share_supply();
        let prior_native = self.native_reserve();
        let quote_reserve = self.get_reserve();

        let minted = if supply == 0 {
            if native_amount == 0 || quote_amount == 0 {
                return Err(PoolError::InvalidAmount(
                    "seeding deposit requires both assets",
                ));
            }
            warn!(
                "Seeding empty pool: {} sets ratio {} native : {} quote",
                caller, native_amount, quote_amount
            );
            native_amount
        } else {
            if native_amount == 0 && quote_amount == 0 {
                return Err(PoolError::InvalidAmount("nothing to deposit"));
            }
            if prior_native == 0 {
                return Err(PoolError::EmptyPool);
            }
            let required = amm_model::required_quote(native_amount, quote_reserve, prior_native)?;
            if quote_amount < required {
                return Err(PoolError::InsufficientQuoteAmount {
                    required,
                    offered: quote_amount,
                });
            }
            debug!(
                "Deposit ratio check: required quote {}, offered {}",
                required, quote_amount
            );
            amm_model::shares_for_deposit(native_amount, supply, prior_native)?
        };

        self.atomically(|pool, journal| {
            pool.attach_native(caller, native_amount, journal)?;
            pool.pull_quote(caller, quote_amount, journal)?;
            pool.mint(caller, minted, journal)
        })?;

        info!(
            "add_liquidity: {} deposited {} native + {} quote, minted {} shares",
            caller, native_amount, quote_amount, minted
        );
        Ok(minted)
    }

    /// Burn `shares` from `caller` and pay out the proportional reserves
    ///
    /// - `native = native_reserve * shares / share_supply` (truncating)
    /// - `quote = quote_reserve * shares / share_supply` (truncating)
    ///
    /// Shares are burned before either transfer-out executes.
    pub fn remove_liquidity(&mut self, caller: &AccountId, shares: u128) -> Result<(u128, u128)> {
        self.check_counterparty(caller)?;
        if shares == 0 {
            return Err(PoolError::InvalidAmount("shares to burn must be positive"));
        }

        let snapshot = self.reserves();
        if snapshot.share_supply == 0 {
            return Err(PoolError::EmptyPool);
        }

        let held = self.shares_of(caller);
        if held < shares {
            return Err(PoolError::InsufficientShares {
                requested: shares,
                available: held,
            });
        }

        let (native_out, quote_out) = amm_model::withdrawal_amounts(
            shares,
            snapshot.native_reserve,
            snapshot.quote_reserve,
            snapshot.share_supply,
        )?;

        self.atomically(|pool, journal| {
            pool.burn(caller, shares, journal)?;
            pool.push_native(caller, native_out, journal)?;
            pool.push_quote(caller, quote_out, journal)
        })?;

        info!(
            "remove_liquidity: {} burned {} shares for {} native + {} quote",
            caller, shares, native_out, quote_out
        );
        Ok((native_out, quote_out))
    }
}

// ============================================================================
// Swap Operations
// ============================================================================

impl<N, Q, S> ReservePool<N, Q, S>
where
    N: TokenLedger,
    Q: TokenLedger,
    S: ShareLedger,
{
    /// Sell `native_in` for quote, paid to `caller`
    pub fn swap_native_for_quote(
        &mut self,
        caller: &AccountId,
        native_in: u128,
        min_quote_out: u128,
    ) -> Result<u128> {
        self.swap_native_for_quote_to(caller, caller, native_in, min_quote_out)
    }

    /// Sell `native_in` from `caller` for quote, paid to `recipient`
    ///
    /// Priced as `price_swap(native_in, prior_native_reserve, quote_reserve)`
    /// where the prior reserve excludes the native attached by this call.
    pub fn swap_native_for_quote_to(
        &mut self,
        caller: &AccountId,
        recipient: &AccountId,
        native_in: u128,
        min_quote_out: u128,
    ) -> Result<u128> {
        self.check_counterparty(caller)?;
        self.check_counterparty(recipient)?;
        if native_in == 0 {
            return Err(PoolError::InvalidAmount("swap input must be positive"));
        }

        let quote = amm_model::quote_swap(native_in, self.native_reserve(), self.get_reserve())?;
        check_slippage(quote.amount_out, min_quote_out)?;
        debug!(
            "Swap quote native->quote: in {} against ({}, {}) -> out {}",
            quote.amount_in, quote.reserve_in, quote.reserve_out, quote.amount_out
        );

        self.atomically(|pool, journal| {
            pool.attach_native(caller, native_in, journal)?;
            pool.push_quote(recipient, quote.amount_out, journal)
        })?;

        info!(
            "swap_native_for_quote: {} sold {} native, {} received {} quote",
            caller, native_in, recipient, quote.amount_out
        );
        Ok(quote.amount_out)
    }

    /// Sell `quote_in` for native
    ///
    /// Quote is pulled in before native is pushed out.
    pub fn swap_quote_for_native(
        &mut self,
        caller: &AccountId,
        quote_in: u128,
        min_native_out: u128,
    ) -> Result<u128> {
        self.check_counterparty(caller)?;
        if quote_in == 0 {
            return Err(PoolError::InvalidAmount("swap input must be positive"));
        }

        let quote = amm_model::quote_swap(quote_in, self.get_reserve(), self.native_reserve())?;
        check_slippage(quote.amount_out, min_native_out)?;
        debug!(
            "Swap quote quote->native: in {} against ({}, {}) -> out {}",
            quote.amount_in, quote.reserve_in, quote.reserve_out, quote.amount_out
        );

        self.atomically(|pool, journal| {
            pool.pull_quote(caller, quote_in, journal)?;
            pool.push_native(caller, quote.amount_out, journal)
        })?;

        info!(
            "swap_quote_for_native: {} sold {} quote for {} native",
            caller, quote_in, quote.amount_out
        );
        Ok(quote.amount_out)
    }
}

#[inline]
fn check_slippage(actual: u128, minimum: u128) -> Result<()> {
    if actual < minimum {
        return Err(PoolError::SlippageExceeded { minimum, actual });
    }
    Ok(())
}

// ============================================================================
// Collaborator Effects
// ============================================================================

impl<N, Q, S> ReservePool<N, Q, S>
where
    N: TokenLedger,
    Q: TokenLedger,
    S: ShareLedger,
{
    /// Every mutating operation runs on behalf of an outside account
    fn check_counterparty(&self, account: &AccountId) -> Result<()> {
        if *account == self.custody {
            return Err(PoolError::CustodyAccount(account.clone()));
        }
        Ok(())
    }

    /// Run `op`, unwinding every recorded effect if it fails
    ///
    /// If any unwind step is itself rejected the error is wrapped in
    /// [`PoolError::UnwindIncomplete`].
    fn atomically<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self, &mut Journal) -> Result<T>,
    {
        let mut journal = Journal::default();
        match op(self, &mut journal) {
            Ok(value) => Ok(value),
            Err(err) => match self.unwind(journal) {
                0 => Err(err),
                failed_steps => Err(PoolError::UnwindIncomplete {
                    cause: Box::new(err),
                    failed_steps,
                }),
            },
        }
    }

    /// Reverse `journal`, returning how many steps could not be reversed
    fn unwind(&mut self, journal: Journal) -> usize {
        let mut failed = 0;
        for effect in journal.effects.into_iter().rev() {
            let custody = &self.custody;
            let outcome = match &effect {
                Effect::NativeIn { from, amount } => self.native.transfer(custody, from, *amount),
                Effect::NativeOut { to, amount } => self.native.transfer(to, custody, *amount),
                Effect::QuoteIn {
                    from,
                    amount,
                    allowance,
                } => self
                    .quote
                    .transfer(custody, from, *amount)
                    .and_then(|()| self.quote.approve(from, custody, *allowance)),
                Effect::QuoteOut { to, amount } => self.quote.transfer(to, custody, *amount),
                Effect::Minted { account, amount } => self.shares.burn_shares(account, *amount),
                Effect::Burned { account, amount } => self.shares.mint_shares(account, *amount),
            };
            match outcome {
                Ok(()) => debug!("Unwound {:?}", effect),
                Err(err) => {
                    error!("Failed to unwind {:?}: {}", effect, err);
                    failed += 1;
                }
            }
        }
        failed
    }

    /// Move the native value attached to a call into custody
    fn attach_native(&mut self, from: &AccountId, amount: u128, journal: &mut Journal) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.native.transfer(from, &self.custody, amount)?;
        journal.record(Effect::NativeIn {
            from: from.clone(),
            amount,
        });
        Ok(())
    }

    fn push_native(&mut self, to: &AccountId, amount: u128, journal: &mut Journal) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.native.transfer(&self.custody, to, amount)?;
        journal.record(Effect::NativeOut {
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    /// Pull quote from `from` using the pool's allowance
    fn pull_quote(&mut self, from: &AccountId, amount: u128, journal: &mut Journal) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let allowance = self.quote.allowance(from, &self.custody);
        self.quote
            .transfer_from(&self.custody, from, &self.custody, amount)?;
        journal.record(Effect::QuoteIn {
            from: from.clone(),
            amount,
            allowance,
        });
        Ok(())
    }

    fn push_quote(&mut self, to: &AccountId, amount: u128, journal: &mut Journal) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.quote.transfer(&self.custody, to, amount)?;
        journal.record(Effect::QuoteOut {
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    fn mint(&mut self, account: &AccountId, amount: u128, journal: &mut Journal) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.shares.mint_shares(account, amount)?;
        journal.record(Effect::Minted {
            account: account.clone(),
            amount,
        });
        Ok(())
    }

    fn burn(&mut self, account: &AccountId, amount: u128, journal: &mut Journal) -> Result<()> {
        self.shares
            .burn_shares(account, amount)
            .map_err(|err| match err {
                LedgerError::InsufficientBalance {
                    needed, available, ..
                } => PoolError::InsufficientShares {
                    requested: needed,
                    available,
                },
                other => PoolError::TransferFailed(other),
            })?;
        journal.record(Effect::Burned {
            account: account.clone(),
            amount,
        });
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
