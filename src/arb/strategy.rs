//! Strategies decide which cycles they watch and how to pick a starting amount.

use std::collections::HashMap;

use alloy::primitives::U256;

use super::amm::QuoteEngine;
use super::cycle::Cycle;
use super::cycle_quote::CycleQuote;
use super::opportunity::{Solution, StrategyKind};
use super::profit::{solve, solve_constant_product};
use super::registry::VenueRegistry;
use super::token::TokenId;
use super::venue::{Protocol, Venue};

/// A way of evaluating cycles.
///
/// Strategies are shared across worker threads, so `evaluate` must only read.
pub trait Strategy: Send + Sync {
    /// Tag attached to the opportunities this strategy finds
    fn kind(&self) -> StrategyKind;

    /// Whether cycles may use `venue`
    fn accepts_venue(&self, _venue: &Venue) -> bool {
        true
    }

    /// Whether the strategy watches an enumerated cycle
    fn accepts_cycle(&self, _cycle: &Cycle, _registry: &VenueRegistry) -> bool {
        true
    }

    /// Best trade through `cycle` at the registry's current state
    fn evaluate(&self, cycle: &Cycle, registry: &VenueRegistry, engine: &QuoteEngine) -> Option<Solution>;
}

/// Solves every cycle with the piecewise profit curve
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtremumStrategy;

impl Strategy for ExtremumStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Extremum
    }

    fn evaluate(&self, cycle: &Cycle, registry: &VenueRegistry, engine: &QuoteEngine) -> Option<Solution> {
        solve(cycle, registry, engine)
    }
}

/// Closed-form optimum for cycles made only of constant-product venues
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstantProductStrategy;

impl Strategy for ConstantProductStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ConstantProduct
    }

    fn accepts_venue(&self, venue: &Venue) -> bool {
        venue.protocol() == Protocol::ConstantProduct
    }

    fn evaluate(&self, cycle: &Cycle, registry: &VenueRegistry, engine: &QuoteEngine) -> Option<Solution> {
        solve_constant_product(cycle, registry, engine)
    }
}

/// A starting amount to try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAmount {
    /// Exactly this amount
    Fixed(U256),
    /// Whatever the profit curve extremum is
    Extremum,
}

/// Tries caller supplied starting amounts on cycles through at least one
/// concentrated-liquidity venue
#[derive(Debug, Default, Clone)]
pub struct FixedAmountStrategy {
    amounts: HashMap<TokenId, Vec<StartAmount>>,
}

impl FixedAmountStrategy {
    /// Creates the strategy from per start token amounts
    #[must_use]
    pub fn new(amounts: HashMap<TokenId, Vec<StartAmount>>) -> Self {
        Self { amounts }
    }
}

impl Strategy for FixedAmountStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FixedAmount
    }

    fn accepts_cycle(&self, cycle: &Cycle, registry: &VenueRegistry) -> bool {
        self.amounts.contains_key(&cycle.start) && cycle.has_concentrated(registry)
    }

    fn evaluate(&self, cycle: &Cycle, registry: &VenueRegistry, engine: &QuoteEngine) -> Option<Solution> {
        if !cycle.has_liquidity(registry) {
            return None;
        }
        let amounts = self.amounts.get(&cycle.start)?;
        amounts
            .iter()
            .filter_map(|amount| match amount {
                StartAmount::Fixed(amount) => {
                    CycleQuote::new(cycle, registry, engine, *amount).and_then(Solution::from_quote)
                }
                StartAmount::Extremum => solve(cycle, registry, engine),
            })
            .reduce(|best, solution| best.better(Some(solution)))
    }
}
