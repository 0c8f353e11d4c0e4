//! Arena of all known venues. Cycles refer to venues by [`VenueId`]; the
//! registry is the single owner of every [`Venue`].

use std::collections::{HashMap, HashSet};

use alloy::primitives::Address;
use eyre::{bail, Report, Result};
use log::{error, info, warn};

use super::token::TokenId;
use super::venue::{Venue, VenueId, VenueState};

/// Venues and tokens that must never be traded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    /// Excluded venue addresses
    pub venues: HashSet<Address>,
    /// Excluded tokens; any venue trading one of them is excluded
    pub tokens: HashSet<TokenId>,
}

impl Blacklist {
    /// Whether `venue` is excluded
    #[must_use]
    pub fn excludes(&self, venue: &Venue) -> bool {
        self.venues.contains(&venue.address)
            || self.tokens.contains(&venue.token0)
            || self.tokens.contains(&venue.token1)
    }
}

/// Outcome of applying a batch of state updates
#[derive(Debug, Default)]
pub struct AppliedUpdates {
    /// Venues whose state actually changed
    pub changed: Vec<VenueId>,
    /// Updates refused because the new state was malformed, by venue address
    pub rejected: Vec<(Address, Report)>,
}

/// Dense arena of venues indexed by [`VenueId`]
#[derive(Debug, Default)]
pub struct VenueRegistry {
    venues: Vec<Venue>,
    by_address: HashMap<Address, VenueId>,
    blacklist: Blacklist,
}

impl VenueRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that refuses blacklisted venues
    #[must_use]
    pub fn with_blacklist(blacklist: Blacklist) -> Self {
        Self {
            blacklist,
            ..Self::default()
        }
    }

    /// Adds a venue and returns its id.
    ///
    /// A venue whose address is already known keeps its existing id and the
    /// new record is ignored. Returns `None` for blacklisted venues.
    pub fn insert(&mut self, mut venue: Venue) -> Option<VenueId> {
        if let Some(id) = self.by_address.get(&venue.address) {
            return Some(*id);
        }
        if self.blacklist.excludes(&venue) {
            return None;
        }
        let id = VenueId(u32::try_from(self.venues.len()).ok()?);
        venue.id = id;
        self.by_address.insert(venue.address, id);
        self.venues.push(venue);
        Some(id)
    }

    /// Adds many venues, returning the ids of the ones that were new
    pub fn extend(&mut self, venues: impl IntoIterator<Item = Venue>) -> Vec<VenueId> {
        let before = self.venues.len();
        let mut excluded = 0;
        for venue in venues {
            if self.insert(venue).is_none() {
                excluded += 1;
            }
        }
        if excluded > 0 {
            info!("Excluded {excluded} blacklisted venues");
        }
        (before..self.venues.len())
            .filter_map(|index| u32::try_from(index).ok().map(VenueId))
            .collect()
    }

    /// The venue with arena index `id`
    #[must_use]
    pub fn get(&self, id: VenueId) -> Option<&Venue> {
        self.venues.get(id.index())
    }

    /// The id of the venue at `address`
    #[must_use]
    pub fn lookup(&self, address: &Address) -> Option<VenueId> {
        self.by_address.get(address).copied()
    }

    /// Replaces the state of one venue.
    ///
    /// Returns whether the state changed.
    ///
    /// # Errors
    ///
    /// * If `id` is not in the registry
    /// * If the new state belongs to another protocol, or changes the fee or
    ///   tick spacing of a concentrated-liquidity venue
    /// * If the new state is malformed
    ///
    /// The previous state is kept on error.
    pub fn update(&mut self, id: VenueId, state: VenueState) -> Result<bool> {
        let Some(venue) = self.venues.get_mut(id.index()) else {
            bail!("Unknown venue {id}");
        };
        match (&venue.state, &state) {
            (VenueState::ConstantProduct(_), VenueState::ConstantProduct(_)) => {}
            (VenueState::ConcentratedLiquidity(old), VenueState::ConcentratedLiquidity(new)) => {
                if old.fee != new.fee || old.tick_spacing != new.tick_spacing {
                    bail!(
                        "Venue {} fee/spacing changed from {}/{} to {}/{}",
                        venue.address,
                        old.fee,
                        old.tick_spacing,
                        new.fee,
                        new.tick_spacing
                    );
                }
            }
            _ => bail!(
                "Venue {} is {}, got a {} state",
                venue.address,
                venue.protocol(),
                state.protocol()
            ),
        }
        if let Err(err) = state.validate() {
            bail!("Venue {} state rejected: {err}", venue.address);
        }
        if venue.state == state {
            return Ok(false);
        }
        venue.state = state;
        Ok(true)
    }

    /// Replaces the state of many venues.
    ///
    /// Malformed updates are logged and reported back; the rest still apply.
    /// Ids outside the arena are skipped with a warning.
    pub fn apply(&mut self, updates: impl IntoIterator<Item = (VenueId, VenueState)>) -> AppliedUpdates {
        let mut applied = AppliedUpdates::default();
        for (id, state) in updates {
            let Some(address) = self.get(id).map(|venue| venue.address) else {
                warn!("Ignoring state update for unknown venue {id}");
                continue;
            };
            match self.update(id, state) {
                Ok(true) => applied.changed.push(id),
                Ok(false) => {}
                Err(err) => {
                    error!("{err}");
                    applied.rejected.push((address, err));
                }
            }
        }
        applied
    }

    /// Whether venue `id` can currently return anything
    #[must_use]
    pub fn has_liquidity(&self, id: VenueId) -> bool {
        self.get(id).is_some_and(|venue| venue.state.has_liquidity())
    }

    /// All venues in id order
    pub fn iter(&self) -> impl Iterator<Item = &Venue> {
        self.venues.iter()
    }

    /// Number of venues
    #[must_use]
    pub fn len(&self) -> usize {
        self.venues.len()
    }

    /// Whether the registry holds no venues
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}
