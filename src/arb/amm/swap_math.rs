//! A single swap step inside one liquidity range.

use alloy::primitives::U256;

use super::full_math::{mul_div, mul_div_rounding_up};
use super::sqrt_price_math::{
    amount0_delta, amount1_delta, next_sqrt_price_from_input, next_sqrt_price_from_output,
};

/// Fee denominator: fees are expressed in hundredths of a bip
pub const MAX_FEE: u32 = 1_000_000;

/// Result of swapping within a single liquidity range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    /// Price after the step, never past the target
    pub sqrt_price_next: U256,
    /// Amount paid in, excluding the fee
    pub amount_in: U256,
    /// Amount received
    pub amount_out: U256,
    /// Fee paid on top of `amount_in`
    pub fee_amount: U256,
}

/// Computes how far a swap of `amount_remaining` moves from `sqrt_price_current`
/// toward `sqrt_price_target` at constant `liquidity`.
///
/// # Arguments
///
/// * `amount_remaining` - Amount still to be swapped
/// * `exact_input` - Whether `amount_remaining` is an input (true) or an output
/// * `fee_pips` - Venue fee in parts per million
///
/// # Returns
///
/// The step result, or `None` if the on-chain math would revert
#[must_use]
pub fn compute_swap_step(
    sqrt_price_current: U256,
    sqrt_price_target: U256,
    liquidity: u128,
    amount_remaining: U256,
    exact_input: bool,
    fee_pips: u32,
) -> Option<SwapStep> {
    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    let fee = U256::from(fee_pips);
    let fee_complement = U256::from(MAX_FEE.checked_sub(fee_pips)?);

    // Amount needed to reach the target on the exact side
    let (exact_side_to_target, sqrt_price_next) = if exact_input {
        let remaining_less_fee = mul_div(amount_remaining, fee_complement, U256::from(MAX_FEE))?;
        let to_target = if zero_for_one {
            amount0_delta(sqrt_price_target, sqrt_price_current, liquidity, true)?
        } else {
            amount1_delta(sqrt_price_current, sqrt_price_target, liquidity, true)?
        };
        let next = if remaining_less_fee >= to_target {
            sqrt_price_target
        } else {
            next_sqrt_price_from_input(sqrt_price_current, liquidity, remaining_less_fee, zero_for_one)?
        };
        (to_target, next)
    } else {
        let to_target = if zero_for_one {
            amount1_delta(sqrt_price_target, sqrt_price_current, liquidity, false)?
        } else {
            amount0_delta(sqrt_price_current, sqrt_price_target, liquidity, false)?
        };
        let next = if amount_remaining >= to_target {
            sqrt_price_target
        } else {
            next_sqrt_price_from_output(sqrt_price_current, liquidity, amount_remaining, zero_for_one)?
        };
        (to_target, next)
    };

    let reached_target = sqrt_price_next == sqrt_price_target;

    let (amount_in, mut amount_out) = if zero_for_one {
        let amount_in = if reached_target && exact_input {
            exact_side_to_target
        } else {
            amount0_delta(sqrt_price_next, sqrt_price_current, liquidity, true)?
        };
        let amount_out = if reached_target && !exact_input {
            exact_side_to_target
        } else {
            amount1_delta(sqrt_price_next, sqrt_price_current, liquidity, false)?
        };
        (amount_in, amount_out)
    } else {
        let amount_in = if reached_target && exact_input {
            exact_side_to_target
        } else {
            amount1_delta(sqrt_price_current, sqrt_price_next, liquidity, true)?
        };
        let amount_out = if reached_target && !exact_input {
            exact_side_to_target
        } else {
            amount0_delta(sqrt_price_current, sqrt_price_next, liquidity, false)?
        };
        (amount_in, amount_out)
    };

    // Never hand out more than was asked for
    if !exact_input && amount_out > amount_remaining {
        amount_out = amount_remaining;
    }

    let fee_amount = if exact_input && !reached_target {
        // Whatever is left of the input becomes fee
        amount_remaining.checked_sub(amount_in)?
    } else {
        mul_div_rounding_up(amount_in, fee, fee_complement)?
    };

    Some(SwapStep {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    })
}
