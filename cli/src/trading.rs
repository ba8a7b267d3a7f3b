//! Swap operations and price quotes

use anyhow::{Context, Result};
use colored::Colorize;

use reserve_pool::{AccountId, InMemoryPool, FEE_DENOMINATOR, FEE_NUMERATOR};

use crate::accounts::Asset;

pub fn swap_native(
    pool: &mut InMemoryPool,
    caller: &AccountId,
    recipient: Option<&AccountId>,
    amount: u128,
    min_out: u128,
) -> Result<()> {
    let recipient = recipient.unwrap_or(caller);

    println!("{}", "=== Swap Native -> Quote ===".bright_green().bold());
    println!("{} {}", "Trader:".bright_cyan(), caller);
    if recipient != caller {
        println!("{} {}", "Recipient:".bright_cyan(), recipient);
    }
    println!("{} {}", "Native in:".bright_cyan(), amount);
    println!("{} {}", "Min out:".bright_cyan(), min_out);

    let out = pool
        .swap_native_for_quote_to(caller, recipient, amount, min_out)
        .with_context(|| format!("swap-native as {} failed", caller))?;

    println!("\n{} {}", "Quote out:".bright_cyan(), out.to_string().green());
    print_reserves(pool);
    Ok(())
}

pub fn swap_quote(pool: &mut InMemoryPool, caller: &AccountId, amount: u128, min_out: u128) -> Result<()> {
    println!("{}", "=== Swap Quote -> Native ===".bright_green().bold());
    println!("{} {}", "Trader:".bright_cyan(), caller);
    println!("{} {}", "Quote in:".bright_cyan(), amount);
    println!("{} {}", "Min out:".bright_cyan(), min_out);

    let out = pool
        .swap_quote_for_native(caller, amount, min_out)
        .with_context(|| format!("swap-quote as {} failed", caller))?;

    println!("\n{} {}", "Native out:".bright_cyan(), out.to_string().green());
    print_reserves(pool);
    Ok(())
}

/// Preview a swap selling `amount` of `sell` without touching the pool
pub fn quote(pool: &InMemoryPool, sell: Asset, amount: u128) -> Result<()> {
    let (out, buy) = match sell {
        Asset::Native => (pool.quote_native_for_quote(amount), "quote"),
        Asset::Quote => (pool.quote_quote_for_native(amount), "native"),
    };
    let out = out.context("Failed to price swap")?;

    println!("{}", "=== Swap Quote ===".bright_green().bold());
    println!("{} {} {:?}", "Sell:".bright_cyan(), amount, sell);
    println!("{} {} {}", "Receive:".bright_cyan(), out.to_string().green(), buy);
    println!(
        "{} {}%",
        "Fee:".bright_cyan(),
        (FEE_DENOMINATOR - FEE_NUMERATOR) * 100 / FEE_DENOMINATOR
    );
    Ok(())
}

fn print_reserves(pool: &InMemoryPool) {
    let reserves = pool.reserves();
    println!(
        "{} {} native / {} quote",
        "Reserves:".bright_cyan(),
        reserves.native_reserve,
        reserves.quote_reserve
    );
}
