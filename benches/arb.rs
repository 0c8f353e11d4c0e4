use alloy::primitives::{Address, U256};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nangle::arb::amm::tick_list::Tick;
use nangle::arb::amm::tick_math::sqrt_ratio_at_tick;
use nangle::arb::amm::QuoteEngine;
use nangle::arb::cycle::Cycle;
use nangle::arb::nangle::{cycle_counts_to_string, enumerate_cycles};
use nangle::arb::profit::solve;
use nangle::arb::registry::VenueRegistry;
use nangle::arb::token::TokenId;
use nangle::arb::venue::{ConcentratedState, ConstantProductState, Venue, VenueId, VenueState};
use rand::Rng;

const E: u128 = 1_000_000_000_000_000_000;

/// Generate a new random address
fn random_address() -> Address {
    let mut bytes = [0u8; 20];
    fastrand::fill(&mut bytes);
    Address::from(bytes)
}

/// Random constant-product venues over `token_count` tokens
fn random_registry(venue_count: usize, token_count: usize) -> (VenueRegistry, TokenId) {
    let mut rng = rand::rng();
    let tokens: Vec<TokenId> = (0..token_count).map(|_| TokenId(random_address())).collect();

    let mut registry = VenueRegistry::new();
    while registry.len() < venue_count {
        let first = rng.random_range(0..token_count);
        let second = rng.random_range(0..token_count);
        if first == second {
            continue;
        }
        let state = VenueState::ConstantProduct(ConstantProductState::new(
            U256::from(rng.random_range(1000..1_000_000u64)),
            U256::from(rng.random_range(1000..1_000_000u64)),
        ));
        if let Ok(venue) = Venue::new(random_address(), tokens[first], tokens[second], state) {
            registry.insert(venue);
        }
    }
    (registry, tokens[0])
}

fn enumeration_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate_cycles");
    for venue_count in [100, 400, 1600] {
        let (registry, start) = random_registry(venue_count, venue_count / 4);
        let cycles = enumerate_cycles(&[start], &[2, 3, 4], &registry, |_| true).unwrap_or_default();
        println!("{venue_count} venues: {}", cycle_counts_to_string(&cycles));

        group.bench_with_input(BenchmarkId::from_parameter(venue_count), &registry, |b, registry| {
            b.iter(|| enumerate_cycles(black_box(&[start]), &[2, 3, 4], registry, |_| true));
        });
    }
    group.finish();
}

/// Constant-product, concentrated, constant-product triangle with a
/// concentrated venue crossing two ticks each way
fn concentrated_triangle() -> (VenueRegistry, Cycle) {
    let [a, b, c] = [TokenId(random_address()), TokenId(random_address()), TokenId(random_address())];
    let base = 10i128.pow(21);
    let concentrated = ConcentratedState {
        sqrt_price_x96: sqrt_ratio_at_tick(10).unwrap_or_default() + U256::from(12_345u64),
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
    };
    let cp = |reserve0: u128, reserve1: u128| {
        VenueState::ConstantProduct(ConstantProductState::new(U256::from(reserve0), U256::from(reserve1)))
    };

    let mut registry = VenueRegistry::new();
    for (token0, token1, state) in [
        (a, b, cp(100 * E, 106 * E)),
        (b, c, VenueState::ConcentratedLiquidity(concentrated)),
        (c, a, cp(100 * E, 100 * E)),
    ] {
        if let Ok(venue) = Venue::new(random_address(), token0, token1, state) {
            registry.insert(venue);
        }
    }
    let cycle = Cycle::new(a, &[VenueId(0), VenueId(1), VenueId(2)], &registry);
    (registry, cycle.unwrap_or_else(|err| panic!("bench fixture: {err}")))
}

fn solve_benchmark(c: &mut Criterion) {
    let (registry, cycle) = concentrated_triangle();
    let engine = QuoteEngine::new();
    println!("solution: {:?}", solve(&cycle, &registry, &engine).map(|s| s.amount_in));

    c.bench_function("solve_concentrated_triangle", |b| {
        b.iter(|| solve(black_box(&cycle), &registry, &engine));
    });
}

criterion_group!(benches, enumeration_benchmark, solve_benchmark);
criterion_main!(benches);
