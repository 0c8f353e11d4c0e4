use alloy::primitives::U256;
use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{Signed, Zero};

use super::amm::concentrated::SwapRange;
use super::amm::constant_product::{FEE_DENOMINATOR, FEE_NUMERATOR};
use super::amm::sqrt_price_math::Q96;
use super::amm::swap_math::MAX_FEE;
use super::venue::{Action, ConstantProductState};

/// Converts an on-chain amount to an arbitrary precision integer
#[must_use]
pub fn to_big(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

/// Converts back to an on-chain amount, `None` if negative or wider than 256 bits
#[must_use]
pub fn from_big(value: &BigInt) -> Option<U256> {
    if value.is_negative() {
        return None;
    }
    let (_, bytes) = value.to_bytes_be();
    U256::try_from_be_slice(&bytes)
}

/// A range of a hop's input over which its output is one rational function.
///
/// Within the segment, for `u = x - from_input` measured from the segment's
/// local origin, the hop returns `from_output + t·u / (m·u + g)`. Input and
/// output bounds are cumulative over the whole hop, half open `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapSegment {
    /// Cumulative input at the segment start
    pub from_input: U256,
    /// Cumulative input at the segment end, `None` when unbounded
    pub to_input: Option<U256>,
    /// Cumulative output at the segment start
    pub from_output: U256,
    /// Cumulative output at the segment end (the asymptote when unbounded)
    pub to_output: U256,
    /// Numerator coefficient
    pub t: BigInt,
    /// Denominator slope
    pub m: BigInt,
    /// Denominator intercept
    pub g: BigInt,
}

impl SwapSegment {
    /// The single unbounded segment of a constant-product hop
    #[must_use]
    pub fn constant_product(state: &ConstantProductState, action: Action) -> Self {
        let (reserve_in, reserve_out) = state.reserves_for(action);
        Self {
            from_input: U256::ZERO,
            to_input: None,
            from_output: U256::ZERO,
            to_output: reserve_out,
            t: to_big(reserve_out) * FEE_NUMERATOR,
            m: BigInt::from(FEE_NUMERATOR),
            g: to_big(reserve_in) * FEE_DENOMINATOR,
        }
    }

    /// Segment for one liquidity range of a concentrated-liquidity hop.
    ///
    /// Selling token0 the curve is `x·P·L / (x·P + L·Q96²/P)` in Q96 terms, so
    /// with `A = sqrt_price` and `Q = Q96` (swapped when buying):
    /// `t = A²·L·(1−f)`, `m = A·Q·(1−f)`, `g = L·Q²`.
    #[must_use]
    pub fn concentrated(
        from_input: U256,
        from_output: U256,
        range: &SwapRange,
        fee: u32,
        zero_for_one: bool,
    ) -> Self {
        let (a, q) = if zero_for_one {
            (to_big(range.sqrt_price_start), to_big(Q96))
        } else {
            (to_big(Q96), to_big(range.sqrt_price_start))
        };
        let liquidity = BigInt::from(range.liquidity);
        let fee_complement = BigInt::from(MAX_FEE - fee);
        let max_fee = BigInt::from(MAX_FEE);

        Self {
            from_input,
            to_input: Some(from_input + range.amount_in),
            from_output,
            to_output: from_output + range.amount_out,
            t: &a * &a * &liquidity * &fee_complement / &max_fee,
            m: &a * &q * &fee_complement / &max_fee,
            g: liquidity * &q * &q,
        }
    }

    /// Whether cumulative input `x` lies inside the segment
    #[must_use]
    pub fn contains_input(&self, x: U256) -> bool {
        x >= self.from_input && self.to_input.is_none_or(|to| x < to)
    }

    /// Cumulative input needed to reach cumulative output `y` on this segment,
    /// rounded up.
    ///
    /// Returns `None` when `y` lies outside the segment's output range or at the
    /// asymptote. A preimage rounded past the segment's input end is clamped to
    /// the end.
    #[must_use]
    pub fn input_for(&self, y: U256) -> Option<U256> {
        if y < self.from_output || y > self.to_output {
            return None;
        }
        let u = to_big(y - self.from_output);
        if u.is_zero() {
            return Some(self.from_input);
        }
        let denominator = &self.t - &self.m * &u;
        if !denominator.is_positive() {
            return None;
        }
        let local = (&self.g * &u).div_ceil(&denominator);
        let x = self.from_input.checked_add(from_big(&local)?)?;
        Some(self.to_input.map_or(x, |to| x.min(to)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::amm::constant_product::amount_out;

    #[test]
    fn test_big_conversion() {
        for value in [U256::ZERO, U256::from(12_345u64), U256::MAX] {
            assert_eq!(from_big(&to_big(value)), Some(value));
        }
        assert_eq!(from_big(&BigInt::from(-1)), None);
        assert_eq!(from_big(&(to_big(U256::MAX) + 1)), None);
    }

    #[test]
    fn test_constant_product_segment_tracks_swap() {
        let state = ConstantProductState::new(U256::from(1_000_000u64), U256::from(2_000_000u64));
        let segment = SwapSegment::constant_product(&state, Action::Sell);
        assert_eq!(segment.t, BigInt::from(997u64 * 2_000_000));
        assert_eq!(segment.m, BigInt::from(997));
        assert_eq!(segment.g, BigInt::from(1_000_000_000u64));
        assert!(segment.contains_input(U256::MAX));

        // the rational form floors to exactly the integer swap output
        let x = BigInt::from(1000);
        let out = &segment.t * &x / (&segment.m * &x + &segment.g);
        assert_eq!(
            from_big(&out),
            amount_out(state.reserve0, state.reserve1, U256::from(1000u64))
        );
    }

    #[test]
    fn test_input_for_inverts_constant_product() {
        let state = ConstantProductState::new(U256::from(1_000_000u64), U256::from(2_000_000u64));
        let segment = SwapSegment::constant_product(&state, Action::Sell);
        let x = segment.input_for(U256::from(1992u64)).unwrap();
        assert!(amount_out(state.reserve0, state.reserve1, x).unwrap() >= U256::from(1992u64));
        assert!(amount_out(state.reserve0, state.reserve1, x - U256::from(1u8)).unwrap() < U256::from(1992u64));
        assert_eq!(segment.input_for(U256::ZERO), Some(U256::ZERO));
        // the asymptote is never reached
        assert_eq!(segment.input_for(state.reserve1), None);
    }
}
