//! Fast unit tests for the reserve pool
//! Run with: cargo test

use reserve_pool::*;

const POOL: &str = "pool";

fn id(name: &str) -> AccountId {
    AccountId::new(name)
}

/// Credit balances to `account` and let the pool pull all of its quote
fn fund<S: ShareLedger>(
    pool: &mut ReservePool<TokenBook, TokenBook, S>,
    account: &str,
    native: u128,
    quote: u128,
) {
    let account = id(account);
    let custody = pool.custody().clone();
    pool.native_ledger_mut().mint(&account, native).unwrap();
    pool.quote_ledger_mut().mint(&account, quote).unwrap();
    pool.quote_ledger_mut()
        .approve(&account, &custody, u128::MAX)
        .unwrap();
}

fn seeded(native: u128, quote: u128) -> InMemoryPool {
    let mut pool = InMemoryPool::in_memory(POOL);
    fund(&mut pool, "seeder", native, quote);
    pool.add_liquidity(&id("seeder"), native, quote).unwrap();
    pool
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn test_first_deposit_seeds_shares() {
    let mut pool = InMemoryPool::in_memory(POOL);
    fund(&mut pool, "alice", 1000, 2000);

    let minted = pool.add_liquidity(&id("alice"), 1000, 2000).unwrap();

    assert_eq!(minted, 1000);
    assert_eq!(pool.get_reserve(), 2000);
    assert_eq!(pool.share_supply(), 1000);
}

#[test]
fn test_second_deposit_is_proportional() {
    let mut pool = seeded(1000, 2000);
    fund(&mut pool, "bob", 500, 1000);

    assert_eq!(pool.required_quote(500), Ok(1000));

    let minted = pool.add_liquidity(&id("bob"), 500, 1000).unwrap();
    assert_eq!(minted, 500);
    assert_eq!(pool.shares_of(&id("bob")), 500);
}

#[test]
fn test_swap_pays_reference_amount() {
    let mut pool = seeded(1000, 2000);
    fund(&mut pool, "trader", 100, 0);

    let out = pool.swap_native_for_quote(&id("trader"), 100, 0).unwrap();

    assert_eq!(out, 180);
    assert_eq!(pool.quote_ledger().balance_of(&id("trader")), 180);
}

#[test]
fn test_overdrawn_withdrawal_leaves_reserves() {
    let mut pool = seeded(1000, 2000);
    let before = pool.clone();

    let result = pool.remove_liquidity(&id("seeder"), 5000);

    assert_eq!(
        result,
        Err(PoolError::InsufficientShares {
            requested: 5000,
            available: 1000,
        })
    );
    assert_eq!(pool, before);
}

#[test]
fn test_min_out_above_output_performs_no_transfer() {
    let mut pool = seeded(1000, 2000);
    fund(&mut pool, "trader", 100, 0);
    let before = pool.clone();

    let result = pool.swap_native_for_quote(&id("trader"), 100, 500);

    assert_eq!(
        result,
        Err(PoolError::SlippageExceeded {
            minimum: 500,
            actual: 180,
        })
    );
    assert_eq!(pool, before);
    assert_eq!(pool.native_ledger().balance_of(&id("trader")), 100);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_deposit_withdraw_round_trip() {
    let mut pool = seeded(1000, 2000);
    fund(&mut pool, "bob", 777, 10_000);

    let required = pool.required_quote(777).unwrap();
    let minted = pool.add_liquidity(&id("bob"), 777, required).unwrap();
    let (native, quote) = pool.remove_liquidity(&id("bob"), minted).unwrap();

    assert_eq!(native, 777);
    assert!(quote <= required);
    assert!(required - quote <= 1, "lost {} quote to rounding", required - quote);
}

#[test]
fn test_pool_returns_to_empty_and_reseeds() {
    let mut pool = seeded(1000, 2000);
    fund(&mut pool, "bob", 500, 1000);
    pool.add_liquidity(&id("bob"), 500, 1000).unwrap();

    pool.remove_liquidity(&id("seeder"), 1000).unwrap();
    pool.remove_liquidity(&id("bob"), 500).unwrap();

    assert!(pool.is_empty());
    assert_eq!(pool.reserves(), PoolSnapshot::default());

    // Seeding rule applies again, at a new ratio
    let minted = pool.add_liquidity(&id("bob"), 300, 30).unwrap();
    assert_eq!(minted, 300);
    assert_eq!(pool.required_quote(100), Ok(10));
}

#[test]
fn test_fees_accrue_to_liquidity_providers() {
    let mut pool = seeded(10_000, 10_000);
    fund(&mut pool, "trader", 5_000, 5_000);

    for _ in 0..10 {
        let out = pool.swap_native_for_quote(&id("trader"), 400, 0).unwrap();
        pool.swap_quote_for_native(&id("trader"), out, 0).unwrap();
    }

    let (native, quote) = pool.remove_liquidity(&id("seeder"), 10_000).unwrap();
    assert!(native * quote > 10_000 * 10_000);
}

#[test]
fn test_tiny_deposit_can_mint_zero_shares() {
    // 1 native into a pool where a share is worth 3 native
    let mut pool = InMemoryPool::in_memory(POOL);
    fund(&mut pool, "seeder", 3000, 3000);
    pool.add_liquidity(&id("seeder"), 1000, 1000).unwrap();
    fund(&mut pool, "trader", 10_000, 0);
    pool.swap_native_for_quote(&id("trader"), 2000, 0).unwrap();

    fund(&mut pool, "bob", 1, 10);
    let required = pool.required_quote(1).unwrap();
    let minted = pool.add_liquidity(&id("bob"), 1, required).unwrap();

    assert_eq!(minted, 0);
}

// ============================================================================
// Custody account
// ============================================================================

#[test]
fn test_custody_cannot_mint_unbacked_shares() {
    let mut pool = seeded(1000, 2000);
    let custody = id(POOL);
    pool.quote_ledger_mut()
        .approve(&custody, &custody, u128::MAX)
        .unwrap();
    let before = pool.clone();

    let result = pool.add_liquidity(&custody, 1000, 2000);

    assert_eq!(result, Err(PoolError::CustodyAccount(custody)));
    assert_eq!(pool, before);
    assert_eq!(pool.withdrawal_preview(1000), Ok((1000, 2000)));
}

#[test]
fn test_custody_cannot_withdraw_or_trade() {
    let mut pool = seeded(1000, 2000);
    let custody = id(POOL);
    let before = pool.clone();

    assert_eq!(
        pool.remove_liquidity(&custody, 1),
        Err(PoolError::CustodyAccount(custody.clone()))
    );
    assert_eq!(
        pool.swap_native_for_quote(&custody, 100, 0),
        Err(PoolError::CustodyAccount(custody.clone()))
    );
    assert_eq!(
        pool.swap_quote_for_native(&custody, 100, 0),
        Err(PoolError::CustodyAccount(custody))
    );
    assert_eq!(pool, before);
}

#[test]
fn test_swap_payout_to_custody_rejected() {
    let mut pool = seeded(1000, 2000);
    fund(&mut pool, "trader", 100, 0);
    let before = pool.clone();

    // Paying custody would leave the sold native in the pool for nothing
    let result = pool.swap_native_for_quote_to(&id("trader"), &id(POOL), 100, 0);

    assert_eq!(result, Err(PoolError::CustodyAccount(id(POOL))));
    assert_eq!(pool, before);
    assert_eq!(pool.native_ledger().balance_of(&id("trader")), 100);
}

// ============================================================================
// Atomicity with a failing collaborator
// ============================================================================

/// Token ledger that rejects any transfer paying out to one account
#[derive(Debug, Clone, PartialEq, Eq)]
struct FlakyLedger {
    inner: TokenBook,
    refuse_payouts_to: Option<AccountId>,
}

impl TokenLedger for FlakyLedger {
    fn balance_of(&self, account: &AccountId) -> u128 {
        self.inner.balance_of(account)
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> std::result::Result<(), LedgerError> {
        if self.refuse_payouts_to.as_ref() == Some(to) {
            return Err(LedgerError::Overflow);
        }
        self.inner.transfer(from, to, amount)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.inner.allowance(owner, spender)
    }

    fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> std::result::Result<(), LedgerError> {
        self.inner.approve(owner, spender, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> std::result::Result<(), LedgerError> {
        self.inner.transfer_from(spender, from, to, amount)
    }
}

#[test]
fn test_failed_quote_payout_unwinds_withdrawal() {
    let mut native = TokenBook::new();
    let mut quote = TokenBook::new();
    native.mint(&id("alice"), 1000).unwrap();
    quote.mint(&id("alice"), 2000).unwrap();
    quote.approve(&id("alice"), &id(POOL), 2000).unwrap();

    let mut pool = ReservePool::new(
        POOL,
        native,
        FlakyLedger {
            inner: quote,
            refuse_payouts_to: None,
        },
        TokenBook::new(),
    );
    pool.add_liquidity(&id("alice"), 1000, 2000).unwrap();

    pool.quote_ledger_mut().refuse_payouts_to = Some(id("alice"));
    let before = pool.clone();

    // Shares burn and native pays out before the quote payout fails
    let result = pool.remove_liquidity(&id("alice"), 400);

    assert!(matches!(result, Err(PoolError::TransferFailed(_))));
    assert_eq!(pool, before);
    assert_eq!(pool.shares_of(&id("alice")), 1000);
    assert_eq!(pool.native_reserve(), 1000);
}

#[test]
fn test_failed_native_payout_unwinds_swap() {
    let mut native = TokenBook::new();
    let mut quote = TokenBook::new();
    native.mint(&id("alice"), 1000).unwrap();
    quote.mint(&id("alice"), 2000).unwrap();
    quote.mint(&id("trader"), 500).unwrap();
    quote.approve(&id("alice"), &id(POOL), 2000).unwrap();
    quote.approve(&id("trader"), &id(POOL), 500).unwrap();

    let mut pool = ReservePool::new(
        POOL,
        FlakyLedger {
            inner: native,
            refuse_payouts_to: Some(id("trader")),
        },
        quote,
        TokenBook::new(),
    );
    pool.add_liquidity(&id("alice"), 1000, 2000).unwrap();
    let before = pool.clone();

    let result = pool.swap_quote_for_native(&id("trader"), 500, 0);

    assert!(matches!(result, Err(PoolError::TransferFailed(_))));
    // Quote pulled before the payout was returned with its allowance
    assert_eq!(pool, before);
    assert_eq!(pool.quote_ledger().balance_of(&id("trader")), 500);
    assert_eq!(pool.quote_ledger().allowance(&id("trader"), &id(POOL)), 500);
}

#[test]
fn test_failed_refund_reports_incomplete_unwind() {
    let mut native = TokenBook::new();
    let mut quote = TokenBook::new();
    native.mint(&id("alice"), 1000).unwrap();
    quote.mint(&id("alice"), 2000).unwrap();
    quote.mint(&id("trader"), 500).unwrap();
    quote.approve(&id("alice"), &id(POOL), 2000).unwrap();
    quote.approve(&id("trader"), &id(POOL), 500).unwrap();

    let mut pool = ReservePool::new(
        POOL,
        FlakyLedger {
            inner: native,
            refuse_payouts_to: Some(id("trader")),
        },
        FlakyLedger {
            inner: quote,
            refuse_payouts_to: None,
        },
        TokenBook::new(),
    );
    pool.add_liquidity(&id("alice"), 1000, 2000).unwrap();

    // Native payout fails, then the quote refund to the trader fails too
    pool.quote_ledger_mut().refuse_payouts_to = Some(id("trader"));
    let result = pool.swap_quote_for_native(&id("trader"), 500, 0);

    match result {
        Err(PoolError::UnwindIncomplete {
            cause,
            failed_steps,
        }) => {
            assert!(matches!(*cause, PoolError::TransferFailed(_)));
            assert_eq!(failed_steps, 1);
        }
        other => panic!("expected incomplete unwind, got {:?}", other),
    }
    // The pulled quote stayed in custody
    assert_eq!(pool.get_reserve(), 2500);
}
