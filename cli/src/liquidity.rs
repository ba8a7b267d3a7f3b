//! Liquidity provider operations

use anyhow::{Context, Result};
use colored::Colorize;

use reserve_pool::{AccountId, InMemoryPool};

pub fn add_liquidity(
    pool: &mut InMemoryPool,
    caller: &AccountId,
    native: u128,
    quote: u128,
) -> Result<()> {
    println!("{}", "=== Add Liquidity ===".bright_green().bold());
    println!("{} {}", "Provider:".bright_cyan(), caller);
    println!("{} {}", "Native:".bright_cyan(), native);
    println!("{} {}", "Quote:".bright_cyan(), quote);

    if pool.is_empty() {
        println!(
            "\n{}",
            "Pool is empty: this deposit sets the price ratio".yellow()
        );
    } else {
        let required = pool
            .required_quote(native)
            .context("Failed to compute required quote")?;
        println!("{} {}", "Required quote:".bright_cyan(), required);
        if quote > required {
            println!(
                "{}",
                format!("{} quote above the minimum will not be refunded", quote - required).yellow()
            );
        }
    }

    let minted = pool
        .add_liquidity(caller, native, quote)
        .with_context(|| format!("add-liquidity as {} failed", caller))?;

    println!("\n{} {}", "Shares minted:".bright_cyan(), minted.to_string().green());
    println!("{} {}", "Shares held:".bright_cyan(), pool.shares_of(caller));
    Ok(())
}

pub fn remove_liquidity(pool: &mut InMemoryPool, caller: &AccountId, shares: u128) -> Result<()> {
    println!("{}", "=== Remove Liquidity ===".bright_green().bold());
    println!("{} {}", "Provider:".bright_cyan(), caller);
    println!("{} {}", "Shares:".bright_cyan(), shares);

    let (native, quote) = pool
        .remove_liquidity(caller, shares)
        .with_context(|| format!("remove-liquidity as {} failed", caller))?;

    println!("\n{} {}", "Native returned:".bright_cyan(), native.to_string().green());
    println!("{} {}", "Quote returned:".bright_cyan(), quote.to_string().green());
    println!("{} {}", "Shares left:".bright_cyan(), pool.shares_of(caller));
    Ok(())
}
