//! Enumeration of N-hop cycles ("nangles") from a start token.
//!
//! Venues are split per start token A into those touching A (the first and
//! last hop) and those touching neither side of A (the middle hops). Each hop
//! count has its own nested-loop construction over the two groups.

use std::collections::HashMap;

use eyre::{bail, Result};
use itertools::Itertools;
use log::{debug, info};

use super::cycle::{Cycle, MAX_HOPS, MIN_HOPS};
use super::registry::VenueRegistry;
use super::token::TokenId;
use super::venue::{Venue, VenueId};

/// Checks every hop count is supported.
///
/// # Errors
///
/// If any count is outside 2..=4.
pub fn validate_hop_counts(hop_counts: &[usize]) -> Result<()> {
    for count in hop_counts {
        if !(MIN_HOPS..=MAX_HOPS).contains(count) {
            bail!("Wrong hop count provided: {count}");
        }
    }
    Ok(())
}

/// Venues around one start token
struct Groups {
    /// Venues touching the start token, keyed by their other token
    first: HashMap<TokenId, Vec<VenueId>>,
    /// Venues not touching the start token, keyed by each of their tokens
    middle: HashMap<TokenId, Vec<VenueId>>,
}

impl Groups {
    fn new<'a>(start: TokenId, venues: impl Iterator<Item = &'a Venue>) -> Self {
        let mut first: HashMap<TokenId, Vec<VenueId>> = HashMap::new();
        let mut middle: HashMap<TokenId, Vec<VenueId>> = HashMap::new();
        for venue in venues {
            if let Some(far) = venue.other(start) {
                first.entry(far).or_default().push(venue.id);
            } else {
                middle.entry(venue.token0).or_default().push(venue.id);
                middle.entry(venue.token1).or_default().push(venue.id);
            }
        }
        Self { first, middle }
    }

    /// `(venue, far token)` for every venue leaving the start token
    fn first_hops(&self) -> impl Iterator<Item = (VenueId, TokenId)> + '_ {
        self.first
            .iter()
            .flat_map(|(far, ids)| ids.iter().map(move |id| (*id, *far)))
    }

    /// Venues returning to the start token from `token`
    fn closing(&self, token: TokenId) -> &[VenueId] {
        self.first.get(&token).map_or(&[], Vec::as_slice)
    }

    /// Middle venues trading `token`
    fn middle(&self, token: TokenId) -> &[VenueId] {
        self.middle.get(&token).map_or(&[], Vec::as_slice)
    }
}

/// Token on the other side of `venue` from `token`
fn far(registry: &VenueRegistry, venue: VenueId, token: TokenId) -> Option<TokenId> {
    registry.get(venue).and_then(|venue| venue.other(token))
}

/// Venue id sequences of every `hops`-hop cycle from `start`
fn walks(groups: &Groups, registry: &VenueRegistry, hops: usize) -> Vec<Vec<VenueId>> {
    let mut walks = Vec::new();
    for (m1, b) in groups.first_hops() {
        match hops {
            2 => {
                for m2 in groups.closing(b) {
                    if *m2 != m1 {
                        walks.push(vec![m1, *m2]);
                    }
                }
            }
            3 => {
                for m2 in groups.middle(b) {
                    let Some(c) = far(registry, *m2, b) else { continue };
                    for m3 in groups.closing(c) {
                        if *m3 != m1 {
                            walks.push(vec![m1, *m2, *m3]);
                        }
                    }
                }
            }
            4 => {
                for m2 in groups.middle(b) {
                    let Some(c) = far(registry, *m2, b) else { continue };
                    for m3 in groups.middle(c) {
                        if m3 == m2 {
                            continue;
                        }
                        let Some(d) = far(registry, *m3, c) else { continue };
                        for m4 in groups.closing(d) {
                            if *m4 != m1 {
                                walks.push(vec![m1, *m2, *m3, *m4]);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    walks
}

/// Enumerates every cycle of the requested hop counts from each start token.
///
/// Only venues accepted by `filter` are used. A start token without venues
/// yields no cycles.
///
/// # Errors
///
/// * If a hop count is outside 2..=4
/// * If a constructed cycle fails validation, which means the registry is
///   inconsistent
pub fn enumerate_cycles(
    start_tokens: &[TokenId],
    hop_counts: &[usize],
    registry: &VenueRegistry,
    filter: impl Fn(&Venue) -> bool,
) -> Result<Vec<Cycle>> {
    validate_hop_counts(hop_counts)?;

    let mut cycles = Vec::new();
    for start in start_tokens {
        let groups = Groups::new(*start, registry.iter().filter(|venue| filter(*venue)));
        if groups.first.is_empty() {
            debug!("No venues trade start token {start}");
            continue;
        }
        for hops in hop_counts.iter().unique() {
            for venues in walks(&groups, registry, *hops) {
                cycles.push(Cycle::new(*start, &venues, registry)?);
            }
        }
    }

    info!("Enumerated cycles: {}", cycle_counts_to_string(&cycles));
    Ok(cycles)
}

/// Summary of cycle counts per hop count, e.g. `N=2: 4, N=3: 8, N=4: 0, total: 12`
#[must_use]
pub fn cycle_counts_to_string(cycles: &[Cycle]) -> String {
    let counts = cycles.iter().counts_by(Cycle::len);
    let per_hops = (MIN_HOPS..=MAX_HOPS)
        .map(|hops| format!("N={hops}: {}", counts.get(&hops).unwrap_or(&0)))
        .join(", ");
    format!("{per_hops}, total: {}", cycles.len())
}

/// Venue id to the cycles that swap through it
#[derive(Debug, Default, Clone)]
pub struct CycleIndex {
    by_venue: HashMap<VenueId, Vec<usize>>,
}

impl CycleIndex {
    /// Indexes `cycles` by position
    #[must_use]
    pub fn build(cycles: &[Cycle]) -> Self {
        let mut by_venue: HashMap<VenueId, Vec<usize>> = HashMap::new();
        for (position, cycle) in cycles.iter().enumerate() {
            for venue in cycle.venues() {
                by_venue.entry(venue).or_default().push(position);
            }
        }
        Self { by_venue }
    }

    /// Positions of the cycles through `venue`
    #[must_use]
    pub fn cycles_for(&self, venue: VenueId) -> &[usize] {
        self.by_venue.get(&venue).map_or(&[], Vec::as_slice)
    }

    /// Positions of the cycles through any of `changed`, each once, ascending
    #[must_use]
    pub fn affected(&self, changed: &[VenueId]) -> Vec<usize> {
        changed
            .iter()
            .flat_map(|venue| self.cycles_for(*venue))
            .copied()
            .sorted_unstable()
            .dedup()
            .collect()
    }
}
