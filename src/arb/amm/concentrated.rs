//! Swap simulation over a concentrated-liquidity venue.
//!
//! The loop mirrors the pool contract step by step: walk to the next
//! initialized tick (or word boundary), swap within that range, cross the tick
//! and adjust liquidity, repeat until the amount is used up or the price limit
//! is hit.

use alloy::primitives::U256;

use super::swap_math::compute_swap_step;
use super::tick_list::next_initialized_tick_within_one_word;
use super::tick_math::{tick_at_sqrt_ratio, TickCache, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};
use crate::arb::venue::ConcentratedState;

/// Budget used when replaying the whole curve for segments
const UNBOUNDED_BUDGET: U256 = U256::from_limbs([u64::MAX, u64::MAX, u64::MAX, 0]);

/// One swap step as seen by the segment builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRange {
    /// Input consumed by the step, fee included
    pub amount_in: U256,
    /// Output produced by the step
    pub amount_out: U256,
    /// Liquidity active during the step
    pub liquidity: u128,
    /// Sqrt-price at the start of the step
    pub sqrt_price_start: U256,
}

/// Totals of a simulated swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SwapTotals {
    /// Specified amount not yet swapped
    remaining: U256,
    /// Sum of the other side: output for exact input, input plus fee for exact output
    calculated: U256,
}

/// Price limit a swap in `zero_for_one` direction may reach
fn price_limit(zero_for_one: bool) -> U256 {
    if zero_for_one {
        MIN_SQRT_RATIO + U256::from(1u8)
    } else {
        MAX_SQRT_RATIO - U256::from(1u8)
    }
}

/// Runs the swap loop and reports every step to `on_step`.
///
/// Returns `None` wherever the pool contract would revert.
fn simulate(
    state: &ConcentratedState,
    cache: &TickCache,
    zero_for_one: bool,
    amount: U256,
    exact_input: bool,
    mut on_step: impl FnMut(SwapRange),
) -> Option<SwapTotals> {
    let limit = price_limit(zero_for_one);
    let price_ok = if zero_for_one {
        limit < state.sqrt_price_x96
    } else {
        limit > state.sqrt_price_x96
    };
    if !price_ok {
        return None;
    }

    let mut remaining = amount;
    let mut calculated = U256::ZERO;
    let mut sqrt_price = state.sqrt_price_x96;
    let mut tick = state.tick;
    let mut liquidity = state.liquidity;

    while !remaining.is_zero() && sqrt_price != limit {
        let sqrt_price_start = sqrt_price;
        let (tick_next, initialized) =
            next_initialized_tick_within_one_word(&state.ticks, tick, state.tick_spacing, zero_for_one);
        let tick_next = tick_next.clamp(MIN_TICK, MAX_TICK);
        let sqrt_price_next = cache.sqrt_ratio_at_tick(tick_next)?;

        let target = if zero_for_one {
            sqrt_price_next.max(limit)
        } else {
            sqrt_price_next.min(limit)
        };

        let step = compute_swap_step(sqrt_price, target, liquidity, remaining, exact_input, state.fee)?;
        sqrt_price = step.sqrt_price_next;
        let paid = step.amount_in.checked_add(step.fee_amount)?;

        if exact_input {
            remaining = remaining.checked_sub(paid)?;
            calculated = calculated.checked_add(step.amount_out)?;
        } else {
            remaining = remaining.checked_sub(step.amount_out)?;
            calculated = calculated.checked_add(paid)?;
        }

        on_step(SwapRange {
            amount_in: paid,
            amount_out: step.amount_out,
            liquidity,
            sqrt_price_start,
        });

        if sqrt_price == sqrt_price_next {
            if let Some(crossed) = initialized {
                let net = if zero_for_one {
                    crossed.liquidity_net.checked_neg()?
                } else {
                    crossed.liquidity_net
                };
                liquidity = liquidity.checked_add_signed(net)?;
                if !exact_input && liquidity == 0 {
                    return None;
                }
            }
            tick = if zero_for_one { tick_next - 1 } else { tick_next };
        } else if sqrt_price != sqrt_price_start {
            tick = tick_at_sqrt_ratio(sqrt_price)?;
        }
    }

    Some(SwapTotals {
        remaining,
        calculated,
    })
}

/// Output received for swapping `amount_in` into the venue.
///
/// `None` when the amount is zero, the venue has no liquidity, the price limit
/// is reached before the whole input is used, or the output is zero.
#[must_use]
pub fn quote_output(
    state: &ConcentratedState,
    cache: &TickCache,
    zero_for_one: bool,
    amount_in: U256,
) -> Option<U256> {
    if amount_in.is_zero() || state.liquidity == 0 {
        return None;
    }
    let totals = simulate(state, cache, zero_for_one, amount_in, true, |_| {})?;
    if !totals.remaining.is_zero() || totals.calculated.is_zero() {
        return None;
    }
    Some(totals.calculated)
}

/// Input, fee included, needed to receive exactly `amount_out` from the venue.
///
/// `None` when the amount is zero, the venue has no liquidity, or the venue
/// cannot supply `amount_out` before reaching the price limit.
#[must_use]
pub fn quote_input(
    state: &ConcentratedState,
    cache: &TickCache,
    zero_for_one: bool,
    amount_out: U256,
) -> Option<U256> {
    if amount_out.is_zero() || state.liquidity == 0 {
        return None;
    }
    let totals = simulate(state, cache, zero_for_one, amount_out, false, |_| {})?;
    if !totals.remaining.is_zero() {
        return None;
    }
    Some(totals.calculated)
}

/// Replays the swap loop from the current price to the protocol price bound
/// and returns every step, in order.
///
/// Consecutive steps at the same liquidity lie on one continuous curve and are
/// merged into a single range; a new range starts at every tick crossing that
/// changes liquidity. A step that takes input but pays nothing out is folded
/// into the range before it (or the first range when none precedes it), so the
/// ranges cover the input axis from zero without gaps.
#[must_use]
pub fn swap_ranges(state: &ConcentratedState, cache: &TickCache, zero_for_one: bool) -> Vec<(U256, SwapRange)> {
    let mut ranges: Vec<(U256, SwapRange)> = Vec::new();
    // Cumulative input before the current step
    let mut offset = U256::ZERO;
    // Input of leading steps that paid nothing out
    let mut pending = U256::ZERO;
    let mut merging = false;

    let walked = simulate(state, cache, zero_for_one, UNBOUNDED_BUDGET, true, |mut step| {
        if step.amount_in.is_zero() {
            merging = false;
            return;
        }
        let amount_in = step.amount_in;
        if step.amount_out.is_zero() {
            match ranges.last_mut() {
                Some((_, last)) => last.amount_in += step.amount_in,
                None => pending += step.amount_in,
            }
        } else {
            let extend = merging
                && ranges
                    .last()
                    .is_some_and(|(_, last)| last.liquidity == step.liquidity);
            if !extend {
                let start = offset - pending;
                step.amount_in += pending;
                pending = U256::ZERO;
                ranges.push((start, step));
            } else if let Some((_, last)) = ranges.last_mut() {
                last.amount_in += step.amount_in;
                last.amount_out += step.amount_out;
            }
            merging = true;
        }
        offset += amount_in;
    });

    if walked.is_none() {
        log::debug!("Swap replay stopped early for venue at tick {}", state.tick);
    }
    ranges
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::amm::tick_list::Tick;
    use crate::arb::amm::tick_math::sqrt_ratio_at_tick;
    use crate::arb::test_helpers::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn u(value: &str) -> U256 {
        U256::from_str(value).unwrap()
    }

    #[test]
    fn test_single_range_quotes_match_reference() {
        let state = single_range_state(3 * 10u128.pow(18));
        let cache = TickCache::new();

        assert_eq!(
            quote_output(&state, &cache, true, u("1000000000000000000")),
            Some(u("1968922630"))
        );
        assert_eq!(
            quote_output(&state, &cache, false, u("1000000000")),
            Some(u("507372896931358395"))
        );
        assert_eq!(
            quote_output(&state, &cache, false, u("5000000000000000")),
            Some(u("65837809009314314690908"))
        );
        assert_eq!(
            quote_input(&state, &cache, true, u("1968922630")),
            Some(u("999999999665745005"))
        );
    }

    #[test]
    fn test_dust_input_is_infeasible() {
        let state = single_range_state(3 * 10u128.pow(18));
        let cache = TickCache::new();
        assert_eq!(quote_output(&state, &cache, true, U256::from(1u8)), None);
        assert_eq!(quote_output(&state, &cache, true, U256::from(1_000_000u64)), None);
        assert_eq!(quote_output(&state, &cache, true, U256::ZERO), None);
    }

    #[test]
    fn test_no_liquidity_is_infeasible() {
        let state = ConcentratedState {
            liquidity: 0,
            ..single_range_state(1)
        };
        let cache = TickCache::new();
        assert_eq!(quote_output(&state, &cache, true, U256::from(1_000u64)), None);
        assert_eq!(quote_input(&state, &cache, true, U256::from(1_000u64)), None);
    }

    #[test]
    fn test_exact_output_beyond_liquidity_is_infeasible() {
        let state = single_range_state(10u128.pow(12));
        let cache = TickCache::new();
        // All token1 below the current price is far less than 1e30
        assert_eq!(quote_input(&state, &cache, true, u("1000000000000000000000000000000")), None);
    }

    #[test]
    fn test_single_range_is_one_segment_per_direction() {
        let state = single_range_state(3 * 10u128.pow(18));
        let cache = TickCache::new();
        for zero_for_one in [true, false] {
            let ranges = swap_ranges(&state, &cache, zero_for_one);
            assert_eq!(ranges.len(), 1);
            let (offset, range) = ranges[0];
            assert_eq!(offset, U256::ZERO);
            assert_eq!(range.sqrt_price_start, state.sqrt_price_x96);
            assert_eq!(range.liquidity, state.liquidity);
        }
    }

    #[test]
    fn test_ranges_split_at_liquidity_changes() {
        let state = stepped_state();
        let cache = TickCache::new();
        let ranges = swap_ranges(&state, &cache, true);
        // current range plus one range per crossed tick, nothing once liquidity runs out
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].1.liquidity, 2 * 10u128.pow(21));
        assert_eq!(ranges[1].1.liquidity, 10u128.pow(21));
        assert_eq!(ranges[1].1.sqrt_price_start, sqrt_ratio_at_tick(-60).unwrap());
        assert_eq!(ranges[2].1.liquidity, 10u128.pow(21) / 2);
        assert_eq!(ranges[2].1.sqrt_price_start, sqrt_ratio_at_tick(-120).unwrap());

        for pair in ranges.windows(2) {
            let (offset, range) = pair[0];
            assert_eq!(offset + range.amount_in, pair[1].0);
        }
    }

    #[test]
    fn test_zero_output_steps_leave_no_gaps() {
        let state = thin_state();
        let cache = TickCache::new();
        for zero_for_one in [true, false] {
            let ranges = swap_ranges(&state, &cache, zero_for_one);
            assert!(!ranges.is_empty());
            assert_eq!(ranges[0].0, U256::ZERO);
            // the dust steps before the first two crossings sit in the first range
            assert_eq!(ranges[0].1.liquidity, 1000);
            assert!(ranges.iter().all(|(_, range)| !range.amount_out.is_zero()));
            for pair in ranges.windows(2) {
                let (offset, range) = pair[0];
                assert_eq!(offset + range.amount_in, pair[1].0);
            }
        }
    }

    #[test]
    fn test_price_limit_already_reached() {
        let state = ConcentratedState {
            sqrt_price_x96: MIN_SQRT_RATIO + U256::from(1u8),
            tick: MIN_TICK,
            ticks: vec![Tick::new(-887_270, 1), Tick::new(887_270, -1)],
            ..single_range_state(1)
        };
        let cache = TickCache::new();
        assert_eq!(quote_output(&state, &cache, true, U256::from(1_000u64)), None);
        assert!(swap_ranges(&state, &cache, true).is_empty());
    }

    proptest! {
        #[test]
        fn prop_quote_output_is_monotonic(amount in 1u128..1_000_000_000_000_000_000, extra in 1u128..100_000_000_000_000_000) {
            let state = stepped_state();
            let cache = TickCache::new();
            for zero_for_one in [true, false] {
                let a = quote_output(&state, &cache, zero_for_one, U256::from(amount)).unwrap_or_default();
                let b = quote_output(&state, &cache, zero_for_one, U256::from(amount + extra)).unwrap_or_default();
                prop_assert!(b >= a);
            }
        }

        #[test]
        fn prop_quote_input_buys_requested_output(wanted in 1_000u128..1_000_000_000_000_000_000) {
            let state = stepped_state();
            let cache = TickCache::new();
            for zero_for_one in [true, false] {
                if let Some(needed) = quote_input(&state, &cache, zero_for_one, U256::from(wanted)) {
                    let received = quote_output(&state, &cache, zero_for_one, needed).unwrap();
                    prop_assert!(received >= U256::from(wanted));
                }
            }
        }
    }
}
