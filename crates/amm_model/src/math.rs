//! Constant product pricing and share math

use crate::{AmmError, FEE_DENOMINATOR, FEE_NUMERATOR};

/// Ephemeral swap quote
///
/// Computed from (input amount, input reserve, output reserve); never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    /// Amount the caller sells
    pub amount_in: u128,

    /// Reserve of the asset being sold, before the swap
    pub reserve_in: u128,

    /// Reserve of the asset being bought, before the swap
    pub reserve_out: u128,

    /// Amount the caller receives
    pub amount_out: u128,
}

impl SwapQuote {
    /// Input reserve after the swap settles (fee stays in the pool)
    pub fn new_reserve_in(&self) -> Result<u128, AmmError> {
        self.reserve_in
            .checked_add(self.amount_in)
            .ok_or(AmmError::Overflow)
    }

    /// Output reserve after the swap settles
    pub fn new_reserve_out(&self) -> Result<u128, AmmError> {
        self.reserve_out
            .checked_sub(self.amount_out)
            .ok_or(AmmError::Overflow)
    }
}

/// `a * b / c`, truncating
#[inline]
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128, AmmError> {
    if c == 0 {
        return Err(AmmError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(AmmError::Overflow)?;
    Ok(product / c)
}

/// Price a swap on the constant product curve with a 1% input fee
///
/// Solves `(x + dx)(y - dy) = x·y` for `dy`, with the fee applied to `dx`
/// only:
///
/// - `input_after_fee = amount_in * 99`
/// - `amount_out = input_after_fee * reserve_out / (reserve_in * 100 + input_after_fee)`
///
/// # Arguments
/// * `amount_in` - Amount of the input asset sold
/// * `reserve_in` - Pool reserve of the input asset (before the swap)
/// * `reserve_out` - Pool reserve of the output asset
///
/// # Returns
/// * Output amount, rounded down
/// * `AmmError::EmptyReserve` if either reserve is zero
pub fn price_swap(amount_in: u128, reserve_in: u128, reserve_out: u128) -> Result<u128, AmmError> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(AmmError::EmptyReserve);
    }

    let input_after_fee = amount_in
        .checked_mul(FEE_NUMERATOR)
        .ok_or(AmmError::Overflow)?;

    let numerator = input_after_fee
        .checked_mul(reserve_out)
        .ok_or(AmmError::Overflow)?;

    let denominator = reserve_in
        .checked_mul(FEE_DENOMINATOR)
        .and_then(|scaled| scaled.checked_add(input_after_fee))
        .ok_or(AmmError::Overflow)?;

    Ok(numerator / denominator)
}

/// [`price_swap`] bundled with the reserves it was computed against
pub fn quote_swap(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
) -> Result<SwapQuote, AmmError> {
    let amount_out = price_swap(amount_in, reserve_in, reserve_out)?;
    Ok(SwapQuote {
        amount_in,
        reserve_in,
        reserve_out,
        amount_out,
    })
}

/// Constant product output with no fee: `amount_in * reserve_out / (reserve_in + amount_in)`
///
/// Reference curve only; the pool never pays this amount.
pub fn no_fee_output(amount_in: u128, reserve_in: u128, reserve_out: u128) -> Result<u128, AmmError> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(AmmError::EmptyReserve);
    }
    let denominator = reserve_in
        .checked_add(amount_in)
        .ok_or(AmmError::Overflow)?;
    mul_div(amount_in, reserve_out, denominator)
}

/// Minimum quote a deposit into a funded pool must offer
///
/// `native_amount * quote_reserve / prior_native_reserve`, truncating.
pub fn required_quote(
    native_amount: u128,
    quote_reserve: u128,
    prior_native_reserve: u128,
) -> Result<u128, AmmError> {
    mul_div(native_amount, quote_reserve, prior_native_reserve)
}

/// Shares minted for a deposit into a funded pool
///
/// `share_supply * native_amount / prior_native_reserve`, truncating.
pub fn shares_for_deposit(
    native_amount: u128,
    share_supply: u128,
    prior_native_reserve: u128,
) -> Result<u128, AmmError> {
    mul_div(share_supply, native_amount, prior_native_reserve)
}

/// Amounts returned for burning `shares` out of `share_supply`
///
/// Returns `(native, quote)`, both truncating.
pub fn withdrawal_amounts(
    shares: u128,
    native_reserve: u128,
    quote_reserve: u128,
    share_supply: u128,
) -> Result<(u128, u128), AmmError> {
    let native = mul_div(native_reserve, shares, share_supply)?;
    let quote = mul_div(quote_reserve, shares, share_supply)?;
    Ok((native, quote))
}
