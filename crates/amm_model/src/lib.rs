//! AMM Model - Pure constant product math (x·y=k) for the reserve pool
//!
//! Every function in this crate is total: invalid inputs and overflow come
//! back as [`AmmError`], nothing panics. The reserve pool engine imports these
//! functions directly so the same code is exercised by unit tests, property
//! tests and Kani harnesses.
//!
//! All quantities are integer amounts in an asset's smallest unit. Every
//! division truncates, which always rounds in favour of the pool.

#![no_std]

pub mod math;

pub use math::{
    mul_div, no_fee_output, price_swap, quote_swap, required_quote, shares_for_deposit,
    withdrawal_amounts, SwapQuote,
};

/// Fee multiplier applied to swap inputs (99/100 = 1% fee)
pub const FEE_NUMERATOR: u128 = 99;

/// Fee denominator; reserves are scaled by this to stay in integers
pub const FEE_DENOMINATOR: u128 = 100;

/// Error types for AMM math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmmError {
    /// One of the reserves is zero
    EmptyReserve,
    /// Divisor is zero
    DivisionByZero,
    /// Arithmetic overflow
    Overflow,
}
