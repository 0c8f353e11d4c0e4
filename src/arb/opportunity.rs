//! Results of evaluating a cycle: per-hop operations, the best solution of a
//! strategy, and the opportunity reported for a block.

use std::fmt::{self, Display};

use alloy::primitives::U256;
use itertools::Itertools;
use serde::Serialize;

use super::cycle_quote::CycleQuote;
use super::token::TokenId;
use super::venue::{Action, VenueId};
use crate::utils::format::{format_amount, DEFAULT_DECIMALS};

/// One executed hop of a quoted cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// Venue swapped through
    pub venue: VenueId,
    /// Token paid
    pub token_in: TokenId,
    /// Token received
    pub token_out: TokenId,
    /// Amount paid
    pub amount_in: U256,
    /// Amount received
    pub amount_out: U256,
    /// Direction relative to the venue's token order
    pub action: Action,
}

/// Strategy that produced a solution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Piecewise profit curve extremum
    #[display("extremum")]
    Extremum,
    /// Closed-form optimum over constant-product virtual reserves
    #[display("constant-product")]
    ConstantProduct,
    /// Caller supplied starting amounts
    #[display("fixed-amount")]
    FixedAmount,
}

/// The best trade a strategy found for one cycle
#[derive(Clone, Debug)]
pub struct Solution {
    /// Starting amount
    pub amount_in: U256,
    /// Final output minus starting amount, always positive
    pub profit: U256,
    /// Exact per-hop quote at `amount_in`
    pub quote: CycleQuote,
}

impl Solution {
    /// Wraps a quote, `None` unless it is profitable
    #[must_use]
    pub fn from_quote(quote: CycleQuote) -> Option<Self> {
        let amount_out = quote.amount_out();
        let amount_in = quote.amount_in();
        if amount_out <= amount_in {
            return None;
        }
        Some(Self {
            amount_in,
            profit: amount_out - amount_in,
            quote,
        })
    }

    /// Keeps the more profitable of two candidates
    #[must_use]
    pub fn better(self, other: Option<Self>) -> Self {
        match other {
            Some(other) if other.profit > self.profit => other,
            _ => self,
        }
    }
}

/// A profitable cycle found for a block
#[derive(Clone, Debug, Serialize)]
pub struct Opportunity {
    /// Block the venue states were read at
    pub block_number: u64,
    /// Strategy that found it
    pub strategy: StrategyKind,
    /// Token the cycle starts and ends with
    pub start_token: TokenId,
    /// Starting amount
    pub amount_in: U256,
    /// Net profit in the start token
    pub profit: U256,
    /// Hops in trading order
    pub operations: Vec<Operation>,
}

impl Opportunity {
    /// Annotates a solution with the block and strategy it came from
    #[must_use]
    pub fn new(block_number: u64, strategy: StrategyKind, start_token: TokenId, solution: Solution) -> Self {
        Self {
            block_number,
            strategy,
            start_token,
            amount_in: solution.amount_in,
            profit: solution.profit,
            operations: solution.quote.into_operations(),
        }
    }
}

impl Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {} [{}] {} in {:?} -> profit {} via {}",
            self.block_number,
            self.strategy,
            format_amount(self.amount_in, DEFAULT_DECIMALS),
            self.start_token,
            format_amount(self.profit, DEFAULT_DECIMALS),
            self.operations
                .iter()
                .map(|op| format!("{}:{}", op.venue, op.action))
                .join(" > ")
        )
    }
}
