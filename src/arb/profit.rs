//! # Profit curve composer
//!
//! Every hop segment is a Möbius map `y = (a·x + b) / (c·x + d)` in cumulative
//! input/output coordinates, so a chain of hops is a 2×2 matrix product. The
//! hops are projected right to left onto the first hop's input, giving pieces
//! of the first hop's domain with one composed curve each. Each piece has a
//! closed-form extremum; candidates are then re-quoted exactly.

use alloy::primitives::U256;
use log::debug;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Signed;

use super::amm::constant_product::{FEE_DENOMINATOR, FEE_NUMERATOR};
use super::amm::QuoteEngine;
use super::cycle::Cycle;
use super::cycle_quote::CycleQuote;
use super::opportunity::Solution;
use super::registry::VenueRegistry;
use super::segment::{from_big, to_big, SwapSegment};
use super::venue::VenueState;

/// `y = (a·x + b) / (c·x + d)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Curve {
    /// Numerator slope
    pub a: BigInt,
    /// Numerator intercept
    pub b: BigInt,
    /// Denominator slope
    pub c: BigInt,
    /// Denominator intercept
    pub d: BigInt,
}

impl Curve {
    /// Lifts a segment's local `t·u / (m·u + g)` into cumulative coordinates
    #[must_use]
    pub fn from_segment(segment: &SwapSegment) -> Self {
        let x0 = to_big(segment.from_input);
        let y0 = to_big(segment.from_output);
        let d = &segment.g - &segment.m * &x0;
        Self {
            a: &y0 * &segment.m + &segment.t,
            b: &y0 * &d - &segment.t * &x0,
            c: segment.m.clone(),
            d,
        }
    }

    /// `self ∘ inner`: apply `inner` first, then `self`
    #[must_use]
    pub fn compose(&self, inner: &Self) -> Self {
        Self {
            a: &self.a * &inner.a + &self.b * &inner.c,
            b: &self.a * &inner.b + &self.b * &inner.d,
            c: &self.c * &inner.a + &self.d * &inner.c,
            d: &self.c * &inner.b + &self.d * &inner.d,
        }
    }

    /// Floored output at `x`, `None` at or past the pole
    #[must_use]
    pub fn output(&self, x: &BigInt) -> Option<BigInt> {
        let denominator = &self.c * x + &self.d;
        if !denominator.is_positive() {
            return None;
        }
        Some((&self.a * x + &self.b).div_floor(&denominator))
    }

    /// Input maximizing `output(x) - x`: `(√(ad − bc) − d) / c`.
    ///
    /// `None` when the curve is not increasing or has no pole on the left.
    #[must_use]
    pub fn extremum(&self) -> Option<BigInt> {
        let determinant = &self.a * &self.d - &self.b * &self.c;
        if !determinant.is_positive() || !self.c.is_positive() {
            return None;
        }
        Some((determinant.sqrt() - &self.d).div_floor(&self.c))
    }

    /// Larger input where `output(x) = x`, past which the cycle only loses.
    ///
    /// `None` when `c` is not positive or the curve never reaches `y = x`.
    #[must_use]
    pub fn breakeven(&self) -> Option<BigInt> {
        if !self.c.is_positive() {
            return None;
        }
        let spread = &self.d - &self.a;
        let discriminant = &spread * &spread + BigInt::from(4) * &self.b * &self.c;
        if discriminant.is_negative() {
            return None;
        }
        Some((discriminant.sqrt() - spread).div_floor(&(BigInt::from(2) * &self.c)))
    }
}

/// A sub-range `[from, to)` of the first hop's input with one composed curve
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    /// First input of the range
    pub from: U256,
    /// End of the range, `None` when unbounded
    pub to: Option<U256>,
    /// Whole-cycle curve over the range
    pub curve: Curve,
}

impl Piece {
    /// Whether no input in the range can return more than it costs
    #[must_use]
    pub fn is_unprofitable(&self) -> bool {
        if !self.curve.c.is_positive() {
            return false;
        }
        self.curve
            .breakeven()
            .is_none_or(|breakeven| breakeven < to_big(self.from))
    }

    /// Amounts worth quoting: the range start, its last input, and the
    /// extremum clipped into the range
    #[must_use]
    pub fn candidates(&self) -> Vec<U256> {
        if self.is_unprofitable() {
            return Vec::new();
        }
        let last = self.to.map(|to| to - U256::from(1u8));
        let mut candidates = Vec::with_capacity(3);
        if !self.from.is_zero() {
            candidates.push(self.from);
        }
        if let Some(last) = last {
            candidates.push(last);
        }
        if let Some(extremum) = self.curve.extremum() {
            let clipped = from_big(&extremum).map_or(self.from, |x| x.max(self.from));
            let clipped = last.map_or(clipped, |last| clipped.min(last));
            if !clipped.is_zero() {
                candidates.push(clipped);
            }
        }
        candidates
    }
}

/// Projects per-hop segments onto the first hop's input.
///
/// Walks the hops right to left. Every upstream segment is split where the
/// downstream pieces begin and end in its output, and each part takes the
/// downstream curve composed with the segment's own. A split with no preimage
/// in the upstream segment drops that part only.
#[must_use]
pub fn project(hops: &[Vec<SwapSegment>]) -> Vec<Piece> {
    let Some((last, upstream)) = hops.split_last() else {
        return Vec::new();
    };
    let mut pieces: Vec<Piece> = last
        .iter()
        .map(|segment| Piece {
            from: segment.from_input,
            to: segment.to_input,
            curve: Curve::from_segment(segment),
        })
        .collect();

    for segments in upstream.iter().rev() {
        let mut projected = Vec::with_capacity(pieces.len());
        for segment in segments {
            let curve = Curve::from_segment(segment);
            for piece in &pieces {
                let lo = segment.from_output.max(piece.from);
                let hi = piece
                    .to
                    .map_or(segment.to_output, |to| to.min(segment.to_output));
                if hi <= lo {
                    continue;
                }
                let from = if lo == segment.from_output {
                    Some(segment.from_input)
                } else {
                    segment.input_for(lo)
                };
                let to = if hi == segment.to_output {
                    Some(segment.to_input)
                } else {
                    segment.input_for(hi).map(Some)
                };
                let (Some(from), Some(to)) = (from, to) else {
                    debug!("Dropping piece with outputs {lo}..{hi}: no preimage in segment from {}", segment.from_input);
                    continue;
                };
                if to.is_some_and(|to| to <= from) {
                    continue;
                }
                projected.push(Piece {
                    from,
                    to,
                    curve: piece.curve.compose(&curve),
                });
            }
        }
        pieces = projected;
    }
    pieces
}

/// Finds the most profitable starting amount for `cycle` at current state.
///
/// # Returns
///
/// `None` when no candidate amount returns more than it costs.
#[must_use]
pub fn solve(cycle: &Cycle, registry: &VenueRegistry, engine: &QuoteEngine) -> Option<Solution> {
    let hops = cycle
        .hops
        .iter()
        .map(|hop| {
            let venue = registry.get(hop.venue)?;
            let segments = engine.swap_segments(&venue.state, hop.action);
            (!segments.is_empty()).then_some(segments)
        })
        .collect::<Option<Vec<_>>>()?;

    let pieces = project(&hops);
    let mut best: Option<Solution> = None;
    for piece in &pieces {
        for amount in piece.candidates() {
            let solution = CycleQuote::new(cycle, registry, engine, amount).and_then(Solution::from_quote);
            if let Some(solution) = solution {
                best = Some(solution.better(best));
            }
        }
    }
    if let Some(solution) = &best {
        debug!("{cycle:?} best {} profit {} over {} pieces", solution.amount_in, solution.profit, pieces.len());
    }
    best
}

/// Optimal input of a constant-product-only cycle, folding the hops into one
/// pair of virtual reserves.
///
/// # Returns
///
/// `None` if a hop is not constant-product or the cycle cannot profit.
#[must_use]
pub fn constant_product_optimum(cycle: &Cycle, registry: &VenueRegistry) -> Option<U256> {
    let numerator = BigInt::from(FEE_NUMERATOR);
    let denominator = BigInt::from(FEE_DENOMINATOR);

    let mut reserves = cycle.hops.iter().map(|hop| match &registry.get(hop.venue)?.state {
        VenueState::ConstantProduct(state) => {
            let (reserve_in, reserve_out) = state.reserves_for(hop.action);
            Some((to_big(reserve_in), to_big(reserve_out)))
        }
        VenueState::ConcentratedLiquidity(_) => None,
    });

    let (mut ea, mut eb) = reserves.next()??;
    for hop in reserves {
        let (reserve_in, reserve_out) = hop?;
        let scale = &denominator * &reserve_in + &numerator * &eb;
        if !scale.is_positive() {
            return None;
        }
        ea = &denominator * &ea * &reserve_in / &scale;
        eb = &numerator * &eb * &reserve_out / &scale;
    }
    if ea >= eb {
        return None;
    }

    let optimum = ((&ea * &eb * &numerator * &denominator).sqrt() - &denominator * &ea) / &numerator;
    if !optimum.is_positive() {
        return None;
    }
    from_big(&optimum)
}

/// Exact quote at the constant-product closed-form optimum
#[must_use]
pub fn solve_constant_product(cycle: &Cycle, registry: &VenueRegistry, engine: &QuoteEngine) -> Option<Solution> {
    let amount = constant_product_optimum(cycle, registry)?;
    CycleQuote::new(cycle, registry, engine, amount).and_then(Solution::from_quote)
}
