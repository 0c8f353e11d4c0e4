//! Token amount deltas between two sqrt-prices and the price reached by
//! adding or removing a token amount at a given liquidity.

use alloy::primitives::U256;

use super::full_math::{div_rounding_up, mul_div, mul_div_rounding_up};

/// 2^96, the Q64.96 scaling factor
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);

/// Largest value representable in 160 bits
const MAX_U160: U256 = U256::from_limbs([u64::MAX, u64::MAX, u32::MAX as u64, 0]);

/// Amount of token0 between two prices for `liquidity`.
///
/// `round_up` selects the rounding used for amounts paid into the pool.
#[must_use]
pub fn amount0_delta(price_a: U256, price_b: U256, liquidity: u128, round_up: bool) -> Option<U256> {
    let (lower, upper) = sorted(price_a, price_b);
    if lower.is_zero() {
        return None;
    }
    let numerator1 = U256::from(liquidity) << 96usize;
    let numerator2 = upper - lower;

    if round_up {
        div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower)
    } else {
        Some(mul_div(numerator1, numerator2, upper)? / lower)
    }
}

/// Amount of token1 between two prices for `liquidity`.
#[must_use]
pub fn amount1_delta(price_a: U256, price_b: U256, liquidity: u128, round_up: bool) -> Option<U256> {
    let (lower, upper) = sorted(price_a, price_b);
    if round_up {
        mul_div_rounding_up(U256::from(liquidity), upper - lower, Q96)
    } else {
        mul_div(U256::from(liquidity), upper - lower, Q96)
    }
}

/// Price after adding (`add`) or removing token0, always rounded up so the
/// price moves no further than the exact amount would take it.
fn next_price_from_amount0_rounding_up(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Option<U256> {
    if amount.is_zero() {
        return Some(sqrt_price);
    }
    let numerator1 = U256::from(liquidity) << 96usize;
    let (product, overflow) = amount.overflowing_mul(sqrt_price);

    if add {
        if !overflow {
            let (denominator, wrapped) = numerator1.overflowing_add(product);
            if !wrapped {
                return mul_div_rounding_up(numerator1, sqrt_price, denominator);
            }
        }
        let fallback = (numerator1 / sqrt_price).checked_add(amount)?;
        div_rounding_up(numerator1, fallback)
    } else {
        if overflow || numerator1 <= product {
            return None;
        }
        let next = mul_div_rounding_up(numerator1, sqrt_price, numerator1 - product)?;
        (next <= MAX_U160).then_some(next)
    }
}

/// Price after adding (`add`) or removing token1, always rounded down.
fn next_price_from_amount1_rounding_down(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Option<U256> {
    let liquidity = U256::from(liquidity);
    if add {
        let quotient = if amount <= MAX_U160 {
            (amount << 96usize).checked_div(liquidity)?
        } else {
            mul_div(amount, Q96, liquidity)?
        };
        let next = sqrt_price.checked_add(quotient)?;
        (next <= MAX_U160).then_some(next)
    } else {
        let quotient = if amount <= MAX_U160 {
            div_rounding_up(amount << 96usize, liquidity)?
        } else {
            mul_div_rounding_up(amount, Q96, liquidity)?
        };
        (sqrt_price > quotient).then(|| sqrt_price - quotient)
    }
}

/// Price reached after swapping `amount_in` into the pool.
#[must_use]
pub fn next_sqrt_price_from_input(
    sqrt_price: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Option<U256> {
    if sqrt_price.is_zero() || liquidity == 0 {
        return None;
    }
    if zero_for_one {
        next_price_from_amount0_rounding_up(sqrt_price, liquidity, amount_in, true)
    } else {
        next_price_from_amount1_rounding_down(sqrt_price, liquidity, amount_in, true)
    }
}

/// Price reached after taking `amount_out` out of the pool.
#[must_use]
pub fn next_sqrt_price_from_output(
    sqrt_price: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Option<U256> {
    if sqrt_price.is_zero() || liquidity == 0 {
        return None;
    }
    if zero_for_one {
        next_price_from_amount1_rounding_down(sqrt_price, liquidity, amount_out, false)
    } else {
        next_price_from_amount0_rounding_up(sqrt_price, liquidity, amount_out, false)
    }
}

/// Orders two prices ascending
fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}
