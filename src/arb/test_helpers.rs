#![allow(clippy::unwrap_used)]

use alloy::primitives::{Address, U256};

use super::amm::tick_list::Tick;
use super::amm::tick_math::sqrt_ratio_at_tick;
use super::cycle::Cycle;
use super::registry::VenueRegistry;
use super::token::TokenId;
use super::venue::{ConcentratedState, ConstantProductState, Venue, VenueId, VenueState};

/// A token whose address spells `name` in its low bytes
pub fn token(name: &str) -> TokenId {
    TokenId(Address::left_padding_from(name.as_bytes()))
}

/// A venue address that never collides with a [`token`]
pub fn address(n: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xaa;
    bytes[12..].copy_from_slice(&n.to_be_bytes());
    Address::from(bytes)
}

pub fn cp_state(reserve0: u128, reserve1: u128) -> VenueState {
    VenueState::ConstantProduct(ConstantProductState::new(
        U256::from(reserve0),
        U256::from(reserve1),
    ))
}

pub fn cp_venue(n: u64, token0: &str, token1: &str, reserve0: u128, reserve1: u128) -> Venue {
    Venue::new(address(n), token(token0), token(token1), cp_state(reserve0, reserve1)).unwrap()
}

pub fn cl_venue(n: u64, token0: &str, token1: &str, state: ConcentratedState) -> Venue {
    Venue::new(
        address(n),
        token(token0),
        token(token1),
        VenueState::ConcentratedLiquidity(state),
    )
    .unwrap()
}

/// Liquidity `liquidity` over nearly the full price range, priced near tick -200463
pub fn single_range_state(liquidity: u128) -> ConcentratedState {
    let net = i128::try_from(liquidity).unwrap();
    ConcentratedState {
        sqrt_price_x96: U256::from(3_516_460_317_698_948_337_590_771u128),
        liquidity,
        tick: -200_463,
        fee: 500,
        tick_spacing: 10,
        ticks: vec![Tick::new(-887_270, net), Tick::new(887_270, -net)],
    }
}

/// Three nested ranges around tick 10, so a swap either way crosses two
/// liquidity changes before running dry
pub fn stepped_state() -> ConcentratedState {
    let base: i128 = 10i128.pow(21);
    ConcentratedState {
        sqrt_price_x96: sqrt_ratio_at_tick(10).unwrap() + U256::from(12_345u64),
        liquidity: 2 * 10u128.pow(21),
        tick: 10,
        fee: 3000,
        tick_spacing: 60,
        ticks: vec![
            Tick::new(-180, base / 2),
            Tick::new(-120, base / 2),
            Tick::new(-60, base),
            Tick::new(60, -base),
            Tick::new(120, -base / 2),
            Tick::new(180, -base / 2),
        ],
    }
}

/// Tick spacing 1 with a few thousand units of liquidity, so the steps to the
/// first crossings take dust input and pay nothing out
pub fn thin_state() -> ConcentratedState {
    ConcentratedState {
        sqrt_price_x96: sqrt_ratio_at_tick(0).unwrap() + U256::from(12_345u64),
        liquidity: 3000,
        tick: 0,
        fee: 3000,
        tick_spacing: 1,
        ticks: vec![
            Tick::new(-887_272, 1000),
            Tick::new(-3, 1000),
            Tick::new(-1, 1000),
            Tick::new(1, -1000),
            Tick::new(3, -1000),
            Tick::new(887_272, -1000),
        ],
    }
}

pub fn registry(venues: Vec<Venue>) -> VenueRegistry {
    let mut registry = VenueRegistry::new();
    for venue in venues {
        registry.insert(venue);
    }
    registry
}

/// A cycle from `start` through the venues with the given arena ids
pub fn cycle(registry: &VenueRegistry, start: &str, venues: &[u32]) -> Cycle {
    let venues: Vec<VenueId> = venues.iter().map(|id| VenueId(*id)).collect();
    Cycle::new(token(start), &venues, registry).unwrap()
}
