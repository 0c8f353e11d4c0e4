//! # AMM Quote Engine
//!
//! Exact integer swap math for the two supported venue families. Quotes
//! reproduce on-chain rounding bit for bit; an amount a venue cannot fill is
//! `None`, never an error.

/// Concentrated-liquidity swap loop
pub mod concentrated;
/// Constant-product swap formulas
pub mod constant_product;
/// 512-bit multiply-divide helpers
pub mod full_math;
/// Token deltas between two sqrt-prices
pub mod sqrt_price_math;
/// A single step of the concentrated-liquidity swap loop
pub mod swap_math;
/// Sorted initialized-tick lists
pub mod tick_list;
/// Tick and sqrt-price conversions
pub mod tick_math;

use alloy::primitives::U256;

use super::segment::SwapSegment;
use super::venue::{Action, VenueState};
use tick_math::TickCache;

/// Quotes swaps against venue state.
///
/// Owns the tick price cache. It is shared by reference across worker threads;
/// the cache only ever grows and concurrent fills of one tick agree.
#[derive(Debug, Default)]
pub struct QuoteEngine {
    cache: TickCache,
}

impl QuoteEngine {
    /// Creates an engine with an empty tick cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tick price cache
    #[must_use]
    pub const fn cache(&self) -> &TickCache {
        &self.cache
    }

    /// Amount received for paying `amount_in` into a venue in direction `action`
    #[must_use]
    pub fn quote_output(&self, state: &VenueState, action: Action, amount_in: U256) -> Option<U256> {
        match state {
            VenueState::ConstantProduct(reserves) => {
                let (reserve_in, reserve_out) = reserves.reserves_for(action);
                constant_product::amount_out(reserve_in, reserve_out, amount_in)
            }
            VenueState::ConcentratedLiquidity(pool) => {
                concentrated::quote_output(pool, &self.cache, action.zero_for_one(), amount_in)
            }
        }
    }

    /// Amount that must be paid into a venue to receive `amount_out`
    #[must_use]
    pub fn quote_input(&self, state: &VenueState, action: Action, amount_out: U256) -> Option<U256> {
        match state {
            VenueState::ConstantProduct(reserves) => {
                let (reserve_in, reserve_out) = reserves.reserves_for(action);
                constant_product::amount_in(reserve_in, reserve_out, amount_out)
            }
            VenueState::ConcentratedLiquidity(pool) => {
                concentrated::quote_input(pool, &self.cache, action.zero_for_one(), amount_out)
            }
        }
    }

    /// The hop's price curve as a list of rational segments, ordered by input.
    ///
    /// A constant-product venue has one unbounded segment. A
    /// concentrated-liquidity venue has one segment per liquidity range between
    /// the current price and the protocol bound. An empty venue has none.
    #[must_use]
    pub fn swap_segments(&self, state: &VenueState, action: Action) -> Vec<SwapSegment> {
        if !state.has_liquidity() {
            return Vec::new();
        }
        match state {
            VenueState::ConstantProduct(reserves) => {
                vec![SwapSegment::constant_product(reserves, action)]
            }
            VenueState::ConcentratedLiquidity(pool) => {
                let zero_for_one = action.zero_for_one();
                let mut from_output = U256::ZERO;
                concentrated::swap_ranges(pool, &self.cache, zero_for_one)
                    .into_iter()
                    .map(|(from_input, range)| {
                        let segment = SwapSegment::concentrated(
                            from_input,
                            from_output,
                            &range,
                            pool.fee,
                            zero_for_one,
                        );
                        from_output += range.amount_out;
                        segment
                    })
                    .collect()
            }
        }
    }
}
