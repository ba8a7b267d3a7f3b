//! Reserve Pool CLI - operator tool for a simulated constant product pool
//!
//! Every invocation loads the pool from a JSON state file, runs one
//! operation as the configured caller, and writes the state back only if the
//! operation succeeded.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod accounts;
mod config;
mod liquidity;
mod state;
mod trading;

use accounts::Asset;
use config::PoolConfig;
use reserve_pool::AccountId;
use state::StateFile;

#[derive(Parser)]
#[command(name = "pool")]
#[command(about = "Reserve Pool CLI - provide liquidity and swap against a constant product pool", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config.toml (default: ~/.config/reserve-pool/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the pool state file (overrides config)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Account acting in this invocation (overrides default_caller)
    #[arg(long)]
    caller: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty pool state file
    Init {
        /// Replace an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Credit test balance to an account
    Faucet {
        /// Asset to credit
        #[arg(long, value_enum)]
        asset: Asset,

        /// Account to credit
        account: String,

        /// Amount in the asset's smallest unit
        amount: u128,
    },

    /// Allow the pool to pull an owner's quote asset
    Approve {
        /// Owner granting the allowance
        owner: String,

        /// Allowance amount (replaces the previous one)
        amount: u128,
    },

    /// Deposit both assets and receive shares
    AddLiquidity {
        /// Native amount attached to the deposit
        #[arg(long)]
        native: u128,

        /// Quote amount offered (excess over the minimum is kept by the pool)
        #[arg(long)]
        quote: u128,
    },

    /// Burn shares for a proportional share of both reserves
    RemoveLiquidity {
        /// Shares to burn
        shares: u128,
    },

    /// Sell native for quote
    SwapNative {
        /// Native amount to sell
        amount: u128,

        /// Minimum quote to accept
        #[arg(long, default_value = "0")]
        min_out: u128,

        /// Account receiving the quote (defaults to the caller)
        #[arg(long)]
        recipient: Option<String>,
    },

    /// Sell quote for native
    SwapQuote {
        /// Quote amount to sell
        amount: u128,

        /// Minimum native to accept
        #[arg(long, default_value = "0")]
        min_out: u128,
    },

    /// Preview a swap without executing it
    Quote {
        /// Asset being sold
        #[arg(value_enum)]
        sell: Asset,

        /// Amount to sell
        amount: u128,
    },

    /// Show reserves, share supply and account balances
    Show {
        /// Only show this account
        account: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let config = PoolConfig::new(cli.config.clone(), cli.state.clone(), cli.caller.clone())?;

    if cli.verbose {
        if let Some(path) = &config.config_path {
            println!("{} {}", "Config:".bright_cyan(), path.display());
        }
        println!("{} {}", "State:".bright_cyan(), config.state_path.display());
        if let Some(caller) = &config.caller {
            println!("{} {}", "Caller:".bright_cyan(), caller);
        }
    }

    match cli.command {
        Commands::Init { force } => {
            let state = StateFile::init(&config.state_path, config.pool_account.clone(), force)?;
            println!("{}", "=== Init ===".bright_green().bold());
            println!("{} {}", "Custody:".bright_cyan(), state.pool.custody());
            println!("{} {}", "State:".bright_cyan(), config.state_path.display());
        }
        Commands::Faucet { asset, account, amount } => {
            let account = AccountId::new(account);
            mutate(&config, |pool| accounts::faucet(pool, asset, &account, amount))?;
        }
        Commands::Approve { owner, amount } => {
            let owner = AccountId::new(owner);
            mutate(&config, |pool| accounts::approve(pool, &owner, amount))?;
        }
        Commands::AddLiquidity { native, quote } => {
            let caller = config.caller()?;
            mutate(&config, |pool| liquidity::add_liquidity(pool, &caller, native, quote))?;
        }
        Commands::RemoveLiquidity { shares } => {
            let caller = config.caller()?;
            mutate(&config, |pool| liquidity::remove_liquidity(pool, &caller, shares))?;
        }
        Commands::SwapNative { amount, min_out, recipient } => {
            let caller = config.caller()?;
            let recipient = recipient.map(AccountId::new);
            mutate(&config, |pool| {
                trading::swap_native(pool, &caller, recipient.as_ref(), amount, min_out)
            })?;
        }
        Commands::SwapQuote { amount, min_out } => {
            let caller = config.caller()?;
            mutate(&config, |pool| trading::swap_quote(pool, &caller, amount, min_out))?;
        }
        Commands::Quote { sell, amount } => {
            let state = StateFile::load(&config.state_path)?;
            trading::quote(&state.pool, sell, amount)?;
        }
        Commands::Show { account } => {
            let state = StateFile::load(&config.state_path)?;
            let account = account.map(AccountId::new);
            accounts::show(&state.pool, account.as_ref())?;
        }
    }

    Ok(())
}

/// Load the pool, apply `op`, and persist only on success
fn mutate<F>(config: &PoolConfig, op: F) -> Result<()>
where
    F: FnOnce(&mut reserve_pool::InMemoryPool) -> Result<()>,
{
    let mut state = StateFile::load(&config.state_path)?;
    op(&mut state.pool)?;
    state.save(&config.state_path)
}
