//! Per-block driver: maps changed venues to affected cycles and runs every
//! registered strategy over them.

use alloy::primitives::{Address, U256};
use eyre::Result;
use log::{debug, info, warn};
use rayon::prelude::*;

use super::amm::QuoteEngine;
use super::cycle::Cycle;
use super::nangle::{cycle_counts_to_string, enumerate_cycles, validate_hop_counts, CycleIndex};
use super::opportunity::Opportunity;
use super::registry::{AppliedUpdates, VenueRegistry};
use super::strategy::Strategy;
use super::token::TokenId;
use super::venue::{Venue, VenueId, VenueState};

/// A registered strategy with the cycles it watches
struct StrategySlot {
    strategy: Box<dyn Strategy>,
    cycles: Vec<Cycle>,
    index: CycleIndex,
}

/// Cycles `strategy` watches among all enumerated ones
fn enumerate_for(
    registry: &VenueRegistry,
    start_tokens: &[TokenId],
    hop_counts: &[usize],
    strategy: &dyn Strategy,
) -> Result<Vec<Cycle>> {
    let cycles = enumerate_cycles(start_tokens, hop_counts, registry, |venue| {
        strategy.accepts_venue(venue)
    })?;
    let cycles: Vec<Cycle> = cycles
        .into_iter()
        .filter(|cycle| strategy.accepts_cycle(cycle, registry))
        .collect();
    info!(
        "Strategy {} watches {}",
        strategy.kind(),
        cycle_counts_to_string(&cycles)
    );
    Ok(cycles)
}

/// Owns the venue registry and the strategies evaluated against it
pub struct Orchestrator {
    registry: VenueRegistry,
    engine: QuoteEngine,
    start_tokens: Vec<TokenId>,
    hop_counts: Vec<usize>,
    min_profit: U256,
    slots: Vec<StrategySlot>,
}

impl Orchestrator {
    /// Creates an orchestrator with no strategies.
    ///
    /// # Errors
    ///
    /// If a hop count is outside 2..=4.
    pub fn new(
        registry: VenueRegistry,
        start_tokens: Vec<TokenId>,
        hop_counts: Vec<usize>,
        min_profit: U256,
    ) -> Result<Self> {
        validate_hop_counts(&hop_counts)?;
        Ok(Self {
            registry,
            engine: QuoteEngine::new(),
            start_tokens,
            hop_counts,
            min_profit,
            slots: Vec::new(),
        })
    }

    /// Adds a strategy and enumerates the cycles it watches.
    ///
    /// # Errors
    ///
    /// If enumeration fails.
    pub fn register(&mut self, strategy: Box<dyn Strategy>) -> Result<()> {
        let cycles = enumerate_for(&self.registry, &self.start_tokens, &self.hop_counts, strategy.as_ref())?;
        let index = CycleIndex::build(&cycles);
        self.slots.push(StrategySlot {
            strategy,
            cycles,
            index,
        });
        Ok(())
    }

    /// The venue registry
    #[must_use]
    pub const fn registry(&self) -> &VenueRegistry {
        &self.registry
    }

    /// Number of watched cycles over all strategies
    #[must_use]
    pub fn cycle_count(&self) -> usize {
        self.slots.iter().map(|slot| slot.cycles.len()).sum()
    }

    /// Every watched cycle, tagged with the strategy watching it
    pub fn cycles(&self) -> impl Iterator<Item = (&dyn Strategy, &Cycle)> {
        self.slots
            .iter()
            .flat_map(|slot| slot.cycles.iter().map(move |cycle| (slot.strategy.as_ref(), cycle)))
    }

    /// Applies new venue states keyed by venue address.
    ///
    /// Unknown addresses are skipped with a warning; malformed states are
    /// rejected and reported, leaving the previous state in place.
    pub fn apply_updates(&mut self, updates: Vec<(Address, VenueState)>) -> AppliedUpdates {
        let mut resolved = Vec::with_capacity(updates.len());
        for (address, state) in updates {
            match self.registry.lookup(&address) {
                Some(id) => resolved.push((id, state)),
                None => warn!("Ignoring state update for unknown venue {address}"),
            }
        }
        self.registry.apply(resolved)
    }

    /// Registers newly discovered venues and re-enumerates cycles when any
    /// were new.
    ///
    /// Returns the ids of the new venues.
    ///
    /// # Errors
    ///
    /// If re-enumeration fails.
    pub fn on_venues_discovered(&mut self, venues: Vec<Venue>) -> Result<Vec<VenueId>> {
        let added = self.registry.extend(venues);
        if added.is_empty() {
            return Ok(added);
        }
        info!("Discovered {} new venues, re-enumerating cycles", added.len());
        let cycles = self
            .slots
            .iter()
            .map(|slot| enumerate_for(&self.registry, &self.start_tokens, &self.hop_counts, slot.strategy.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        for (slot, cycles) in self.slots.iter_mut().zip(cycles) {
            slot.index = CycleIndex::build(&cycles);
            slot.cycles = cycles;
        }
        Ok(added)
    }

    /// Evaluates every cycle touching `changed` with every strategy.
    ///
    /// Returns opportunities above the minimum profit, best first. A cycle
    /// touched by several changed venues is evaluated once per strategy.
    #[must_use]
    pub fn on_venues_changed(&self, changed: &[VenueId], block_number: u64) -> Vec<Opportunity> {
        let known: Vec<VenueId> = changed
            .iter()
            .copied()
            .filter(|id| {
                let known = self.registry.get(*id).is_some();
                if !known {
                    warn!("Ignoring unknown venue {id}");
                }
                known
            })
            .collect();

        let work: Vec<(&StrategySlot, &Cycle)> = self
            .slots
            .iter()
            .flat_map(|slot| {
                slot.index
                    .affected(&known)
                    .into_iter()
                    .filter_map(move |position| slot.cycles.get(position).map(|cycle| (slot, cycle)))
            })
            .collect();

        let mut opportunities: Vec<Opportunity> = work
            .par_iter()
            .filter_map(|(slot, cycle)| {
                let solution = slot.strategy.evaluate(cycle, &self.registry, &self.engine)?;
                if solution.profit <= self.min_profit {
                    debug!("{cycle:?} profit {} below minimum", solution.profit);
                    return None;
                }
                Some(Opportunity::new(block_number, slot.strategy.kind(), cycle.start, solution))
            })
            .collect();
        opportunities.sort_by(|a, b| b.profit.cmp(&a.profit));

        info!(
            "Block {block_number}: {} venues changed, {} cycles evaluated, {} opportunities",
            known.len(),
            work.len(),
            opportunities.len()
        );
        opportunities
    }

    /// Evaluates every watched cycle
    #[must_use]
    pub fn evaluate_all(&self, block_number: u64) -> Vec<Opportunity> {
        let all: Vec<VenueId> = self.registry.iter().map(|venue| venue.id).collect();
        self.on_venues_changed(&all, block_number)
    }
}
