//! Trading venues: immutable identity plus the replaceable on-chain state.

use std::fmt::{self, Debug, Display};

use alloy::primitives::{Address, U256};
use eyre::{bail, Result};
use serde::Serialize;

use super::amm::swap_math::MAX_FEE;
use super::amm::tick_list::{validate_ticks, Tick};
use super::amm::tick_math::{MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};
use super::token::TokenId;

/// Dense index of a venue in the [`VenueRegistry`](super::registry::VenueRegistry) arena
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Serialize)]
pub struct VenueId(pub u32);

impl VenueId {
    /// Position in the arena
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// AMM family of a venue
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, derive_more::Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// x·y = k pools with a 0.3% fee
    #[display("constant-product")]
    ConstantProduct,
    /// Tick-ranged liquidity pools
    #[display("concentrated-liquidity")]
    ConcentratedLiquidity,
}

/// Direction of a hop relative to the venue's (token0, token1) orientation
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, derive_more::Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Pay token1, receive token0
    #[display("buy")]
    Buy,
    /// Pay token0, receive token1
    #[display("sell")]
    Sell,
}

impl Action {
    /// Whether the hop pays token0 into the venue
    #[must_use]
    pub const fn zero_for_one(self) -> bool {
        matches!(self, Self::Sell)
    }
}

/// Reserves of a constant-product venue
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub struct ConstantProductState {
    /// Reserve of token0
    pub reserve0: U256,
    /// Reserve of token1
    pub reserve1: U256,
}

impl ConstantProductState {
    /// Creates a reserve pair
    #[must_use]
    pub const fn new(reserve0: U256, reserve1: U256) -> Self {
        Self { reserve0, reserve1 }
    }

    /// `(reserve_in, reserve_out)` for a hop in direction `action`
    #[must_use]
    pub const fn reserves_for(&self, action: Action) -> (U256, U256) {
        match action {
            Action::Sell => (self.reserve0, self.reserve1),
            Action::Buy => (self.reserve1, self.reserve0),
        }
    }
}

/// Price, liquidity and initialized ticks of a concentrated-liquidity venue
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ConcentratedState {
    /// Current sqrt-price, Q64.96
    pub sqrt_price_x96: U256,
    /// Liquidity active at the current price
    pub liquidity: u128,
    /// Current tick
    pub tick: i32,
    /// Fee in parts per million
    pub fee: u32,
    /// Distance between usable ticks
    pub tick_spacing: i32,
    /// Initialized ticks, strictly ascending
    pub ticks: Vec<Tick>,
}

impl ConcentratedState {
    /// Checks the state can be simulated.
    ///
    /// # Errors
    ///
    /// * If the fee is not below 100%
    /// * If the tick or sqrt-price is outside the protocol bounds
    /// * If the tick list is malformed (see [`validate_ticks`])
    pub fn validate(&self) -> Result<()> {
        if self.fee >= MAX_FEE {
            bail!("Fee {} must be below {}", self.fee, MAX_FEE);
        }
        if !(MIN_TICK..=MAX_TICK).contains(&self.tick) {
            bail!("Current tick {} is out of range", self.tick);
        }
        if self.sqrt_price_x96 < MIN_SQRT_RATIO || self.sqrt_price_x96 >= MAX_SQRT_RATIO {
            bail!("Sqrt price {} is out of range", self.sqrt_price_x96);
        }
        validate_ticks(&self.ticks, self.tick_spacing)
    }
}

/// Current on-chain state of a venue, one variant per protocol
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum VenueState {
    /// Constant-product reserves
    ConstantProduct(ConstantProductState),
    /// Concentrated-liquidity price and ticks
    ConcentratedLiquidity(ConcentratedState),
}

impl VenueState {
    /// Protocol tag of this state
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::ConstantProduct(_) => Protocol::ConstantProduct,
            Self::ConcentratedLiquidity(_) => Protocol::ConcentratedLiquidity,
        }
    }

    /// Whether a swap through this state can return anything at all
    #[must_use]
    pub fn has_liquidity(&self) -> bool {
        match self {
            Self::ConstantProduct(state) => {
                !state.reserve0.is_zero() && !state.reserve1.is_zero()
            }
            Self::ConcentratedLiquidity(state) => state.liquidity > 0,
        }
    }

    /// Checks the state satisfies its protocol invariants.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ConstantProduct(_) => Ok(()),
            Self::ConcentratedLiquidity(state) => state.validate(),
        }
    }
}

/// A trading venue between two tokens.
///
/// Identity (address, tokens, protocol) never changes once the venue is
/// registered. Only `state` is replaced when new chain data arrives.
#[derive(Clone, PartialEq, Eq)]
pub struct Venue {
    /// Arena index assigned by the registry
    pub id: VenueId,
    /// Contract address of the venue
    pub address: Address,
    /// First token of the pair
    pub token0: TokenId,
    /// Second token of the pair
    pub token1: TokenId,
    /// Current state
    pub state: VenueState,
}

impl Venue {
    /// Creates a venue. The id is reassigned when the venue is registered.
    ///
    /// # Errors
    ///
    /// * If both tokens are the same
    /// * If the state is malformed
    pub fn new(address: Address, token0: TokenId, token1: TokenId, state: VenueState) -> Result<Self> {
        if token0 == token1 {
            bail!("Venue {address} token0 and token1 must be different");
        }
        state.validate()?;
        Ok(Self {
            id: VenueId(u32::MAX),
            address,
            token0,
            token1,
            state,
        })
    }

    /// Protocol of the venue
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.state.protocol()
    }

    /// Whether the venue trades `token`
    #[must_use]
    pub fn touches(&self, token: TokenId) -> bool {
        self.token0 == token || self.token1 == token
    }

    /// The token on the other side of `token`, if the venue trades it
    #[must_use]
    pub fn other(&self, token: TokenId) -> Option<TokenId> {
        if self.token0 == token {
            Some(self.token1)
        } else if self.token1 == token {
            Some(self.token0)
        } else {
            None
        }
    }

    /// Action that pays `token_in` into this venue
    #[must_use]
    pub fn action_for(&self, token_in: TokenId) -> Option<Action> {
        if self.token0 == token_in {
            Some(Action::Sell)
        } else if self.token1 == token_in {
            Some(Action::Buy)
        } else {
            None
        }
    }

    /// `(token_in, token_out)` for a hop in direction `action`
    #[must_use]
    pub const fn tokens_for(&self, action: Action) -> (TokenId, TokenId) {
        match action {
            Action::Sell => (self.token0, self.token1),
            Action::Buy => (self.token1, self.token0),
        }
    }
}

impl Debug for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Venue({} {:?}/{:?} {})",
            self.id,
            self.token0,
            self.token1,
            self.protocol()
        )
    }
}

impl Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.protocol())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::*;

    #[test]
    fn test_orientation() {
        let venue = cp_venue(0, "A", "B", 100, 200);
        assert_eq!(venue.action_for(token("A")), Some(Action::Sell));
        assert_eq!(venue.action_for(token("B")), Some(Action::Buy));
        assert_eq!(venue.action_for(token("C")), None);
        assert_eq!(venue.tokens_for(Action::Buy), (token("B"), token("A")));
        assert_eq!(venue.other(token("A")), Some(token("B")));
        assert!(venue.touches(token("B")));
        assert!(!venue.touches(token("C")));
    }

    #[test]
    fn test_display() {
        assert_eq!(VenueId(7).to_string(), "#7");
        assert_eq!(Protocol::ConcentratedLiquidity.to_string(), "concentrated-liquidity");
        assert_eq!(format!("{}/{}", Action::Buy, Action::Sell), "buy/sell");
    }

    #[test]
    fn test_reserves_for() {
        let state = ConstantProductState::new(U256::from(1u8), U256::from(2u8));
        assert_eq!(state.reserves_for(Action::Sell), (U256::from(1u8), U256::from(2u8)));
        assert_eq!(state.reserves_for(Action::Buy), (U256::from(2u8), U256::from(1u8)));
    }

    #[test]
    fn test_new_rejects_same_tokens() {
        let state = VenueState::ConstantProduct(ConstantProductState::default());
        let venue = Venue::new(address(1), token("A"), token("A"), state);
        assert_eq!(
            venue.err().unwrap().to_string(),
            format!("Venue {} token0 and token1 must be different", address(1))
        );
    }

    #[test]
    fn test_liquidity() {
        let empty = VenueState::ConstantProduct(ConstantProductState::new(U256::ZERO, U256::from(1u8)));
        assert!(!empty.has_liquidity());
        let cl = single_range_state(3 * 10u128.pow(18));
        assert!(VenueState::ConcentratedLiquidity(cl.clone()).has_liquidity());
        let drained = ConcentratedState { liquidity: 0, ..cl };
        assert!(!VenueState::ConcentratedLiquidity(drained).has_liquidity());
    }

    #[test]
    fn test_validate_concentrated() {
        let state = single_range_state(1);
        state.validate().unwrap();

        let bad_fee = ConcentratedState { fee: MAX_FEE, ..state.clone() };
        assert_eq!(
            bad_fee.validate().err().unwrap().to_string(),
            "Fee 1000000 must be below 1000000"
        );

        let bad_price = ConcentratedState { sqrt_price_x96: U256::from(1u8), ..state };
        assert_eq!(
            bad_price.validate().err().unwrap().to_string(),
            "Sqrt price 1 is out of range"
        );
    }
}
