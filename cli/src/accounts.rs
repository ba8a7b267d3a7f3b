//! Host-side account operations: faucet, allowances and pool inspection

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use log::info;
use std::collections::BTreeSet;

use reserve_pool::{AccountId, InMemoryPool, TokenLedger};

/// Which of the pool's two assets a command refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Asset {
    Native,
    Quote,
}

/// Credit test balance to `account`
pub fn faucet(pool: &mut InMemoryPool, asset: Asset, account: &AccountId, amount: u128) -> Result<()> {
    println!("{}", "=== Faucet ===".bright_green().bold());
    println!("{} {:?}", "Asset:".bright_cyan(), asset);
    println!("{} {}", "Account:".bright_cyan(), account);
    println!("{} {}", "Amount:".bright_cyan(), amount);

    let ledger = match asset {
        Asset::Native => pool.native_ledger_mut(),
        Asset::Quote => pool.quote_ledger_mut(),
    };
    ledger
        .mint(account, amount)
        .with_context(|| format!("Failed to credit {} to {}", amount, account))?;

    info!("faucet: credited {} {:?} to {}", amount, asset, account);
    println!("\n{} {}", "Balance:".bright_cyan(), ledger.balance_of(account));
    Ok(())
}

/// Let the pool pull up to `amount` of `owner`'s quote asset
pub fn approve(pool: &mut InMemoryPool, owner: &AccountId, amount: u128) -> Result<()> {
    println!("{}", "=== Approve ===".bright_green().bold());
    println!("{} {}", "Owner:".bright_cyan(), owner);
    println!("{} {}", "Spender:".bright_cyan(), pool.custody());
    println!("{} {}", "Amount:".bright_cyan(), amount);

    let custody = pool.custody().clone();
    pool.quote_ledger_mut()
        .approve(owner, &custody, amount)
        .with_context(|| format!("Failed to set allowance for {}", owner))?;

    info!("approve: {} allows pool to pull {} quote", owner, amount);
    println!("\n{}", "Allowance updated".green());
    Ok(())
}

/// Reserves, supply and either one account or every known account
pub fn show(pool: &InMemoryPool, account: Option<&AccountId>) -> Result<()> {
    let reserves = pool.reserves();

    println!("{}", "=== Pool ===".bright_green().bold());
    println!("{} {}", "Custody:".bright_cyan(), pool.custody());
    println!("{} {}", "Native reserve:".bright_cyan(), reserves.native_reserve);
    println!("{} {}", "Quote reserve:".bright_cyan(), reserves.quote_reserve);
    println!("{} {}", "Share supply:".bright_cyan(), reserves.share_supply);

    if pool.is_empty() {
        println!("{} {}", "Status:".bright_cyan(), "empty (next deposit sets the ratio)".yellow());
    } else if reserves.native_reserve > 0 {
        let spot = reserves.quote_reserve as f64 / reserves.native_reserve as f64;
        println!("{} {:.6} quote/native", "Spot price:".bright_cyan(), spot);
        if let Some(k) = reserves.invariant() {
            println!("{} {}", "Invariant k:".bright_cyan(), k);
        }
    }

    let accounts: Vec<AccountId> = match account {
        Some(account) => vec![account.clone()],
        None => known_accounts(pool),
    };

    if accounts.is_empty() {
        println!("\n{}", "No accounts yet".dimmed());
        return Ok(());
    }

    println!("\n{}", "=== Accounts ===".bright_green().bold());
    for account in &accounts {
        print_account(pool, account)?;
    }
    Ok(())
}

fn print_account(pool: &InMemoryPool, account: &AccountId) -> Result<()> {
    let shares = pool.shares_of(account);

    println!("{}", account.as_str().bold());
    println!("  {} {}", "Native:".bright_cyan(), pool.native_ledger().balance_of(account));
    println!("  {} {}", "Quote:".bright_cyan(), pool.quote_ledger().balance_of(account));
    println!(
        "  {} {}",
        "Allowance:".bright_cyan(),
        pool.quote_ledger().allowance(account, pool.custody())
    );
    println!("  {} {}", "Shares:".bright_cyan(), shares);

    if shares > 0 {
        let (native, quote) = pool
            .withdrawal_preview(shares)
            .with_context(|| format!("Failed to value shares of {}", account))?;
        println!(
            "  {} {} native + {} quote",
            "Redeemable:".bright_cyan(),
            native,
            quote
        );
    }
    Ok(())
}

/// Every account holding a balance or shares, excluding custody
fn known_accounts(pool: &InMemoryPool) -> Vec<AccountId> {
    let custody = pool.custody();
    pool.native_ledger()
        .accounts()
        .chain(pool.quote_ledger().accounts())
        .chain(pool.share_ledger().accounts())
        .map(|(account, _)| account)
        .filter(|account| *account != custody)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
