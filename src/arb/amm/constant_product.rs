//! Constant-product (x·y = k) swap math with the 0.3% fee convention.

use alloy::primitives::U256;

/// Fee-adjusted numerator multiplier (1000 - 3)
pub const FEE_NUMERATOR: u64 = 997;
/// Fee denominator
pub const FEE_DENOMINATOR: u64 = 1000;

/// Output for `amount_in` against `reserve_in`/`reserve_out`.
///
/// `amount_out = amount_in * 997 * reserve_out / (reserve_in * 1000 + amount_in * 997)`
///
/// # Returns
///
/// `None` when either reserve or the amount is zero, when the output rounds to
/// zero, or when an intermediate product overflows.
#[must_use]
pub fn amount_out(reserve_in: U256, reserve_out: U256, amount_in: U256) -> Option<U256> {
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_in.is_zero() {
        return None;
    }
    let amount_in_with_fee = amount_in.checked_mul(U256::from(FEE_NUMERATOR))?;
    let numerator = amount_in_with_fee.checked_mul(reserve_out)?;
    let denominator = reserve_in
        .checked_mul(U256::from(FEE_DENOMINATOR))?
        .checked_add(amount_in_with_fee)?;
    let amount_out = numerator / denominator;
    (!amount_out.is_zero()).then_some(amount_out)
}

/// Input required to receive `amount_out`, rounded up by one.
///
/// `amount_in = reserve_in * amount_out * 1000 / ((reserve_out - amount_out) * 997) + 1`
///
/// # Returns
///
/// `None` when either reserve or the amount is zero, or when `amount_out`
/// would drain the output reserve.
#[must_use]
pub fn amount_in(reserve_in: U256, reserve_out: U256, amount_out: U256) -> Option<U256> {
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_out.is_zero() {
        return None;
    }
    if amount_out >= reserve_out {
        return None;
    }
    let numerator = reserve_in
        .checked_mul(amount_out)?
        .checked_mul(U256::from(FEE_DENOMINATOR))?;
    let denominator = (reserve_out - amount_out).checked_mul(U256::from(FEE_NUMERATOR))?;
    (numerator / denominator).checked_add(U256::from(1u8))
}
