use alloy::primitives::{I256, U256};

use super::amm::QuoteEngine;
use super::cycle::Cycle;
use super::opportunity::Operation;
use super::registry::VenueRegistry;

/// Represents an exact quote for a complete trading cycle, one operation per hop.
///
/// Each hop is quoted with the venue's on-chain integer math against the
/// registry's current state, feeding its output into the next hop. This is
/// the authority on what a starting amount actually returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleQuote {
    /// The operations of the cycle in trading order
    operations: Vec<Operation>,
}

impl CycleQuote {
    /// Quotes every hop of `cycle` for a starting `amount_in`.
    ///
    /// # Returns
    ///
    /// `None` if any hop cannot fill the amount it receives, or if a venue is
    /// missing from the registry.
    #[must_use]
    pub fn new(cycle: &Cycle, registry: &VenueRegistry, engine: &QuoteEngine, amount_in: U256) -> Option<Self> {
        let mut operations = Vec::with_capacity(cycle.len());
        let mut amount = amount_in;
        for hop in &cycle.hops {
            let venue = registry.get(hop.venue)?;
            let amount_out = engine.quote_output(&venue.state, hop.action, amount)?;
            operations.push(Operation {
                venue: hop.venue,
                token_in: hop.token_in,
                token_out: hop.token_out,
                amount_in: amount,
                amount_out,
                action: hop.action,
            });
            amount = amount_out;
        }
        if operations.is_empty() {
            return None;
        }
        Some(Self { operations })
    }

    /// The per-hop operations
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Consumes the quote, returning its operations
    #[must_use]
    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Calculates the profit for this cycle quote.
    ///
    /// # Returns
    ///
    /// The profit as an I256 value (can be negative if the cycle is not profitable)
    #[must_use]
    pub fn profit(&self) -> I256 {
        I256::from_raw(self.amount_out()).saturating_sub(I256::from_raw(self.amount_in()))
    }

    /// Determines whether this cycle quote is profitable (has a positive profit).
    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.amount_out() > self.amount_in()
    }

    /// Returns the initial amount input into the first hop of the cycle.
    #[must_use]
    pub fn amount_in(&self) -> U256 {
        self.operations
            .first()
            .map_or(U256::ZERO, |operation| operation.amount_in)
    }

    /// Returns the final amount output from the last hop of the cycle.
    #[must_use]
    pub fn amount_out(&self) -> U256 {
        self.operations
            .last()
            .map_or(U256::ZERO, |operation| operation.amount_out)
    }
}
