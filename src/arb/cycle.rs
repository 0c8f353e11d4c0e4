//! Cycle is a closed walk of hops through distinct venues (first and last token are the same).
//! It only stores venue ids; current venue state is read from the registry when quoting.

use std::{
    collections::HashSet,
    fmt::{self, Debug},
};

use eyre::{bail, Result};

use super::registry::VenueRegistry;
use super::token::TokenId;
use super::venue::{Action, Protocol, VenueId};

/// Minimum number of hops in a cycle
pub const MIN_HOPS: usize = 2;
/// Maximum number of hops in a cycle
pub const MAX_HOPS: usize = 4;

/// One swap of a cycle
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Hop {
    /// Venue swapped through
    pub venue: VenueId,
    /// Direction relative to the venue's token order
    pub action: Action,
    /// Token paid into the venue
    pub token_in: TokenId,
    /// Token received from the venue
    pub token_out: TokenId,
}

/// A sequence of hops that starts and ends at the same token
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Cycle {
    /// Token the cycle starts and ends with
    pub start: TokenId,
    /// Hops in trading order
    pub hops: Vec<Hop>,
}

impl Debug for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cycle({:?}", self.start)?;
        for hop in &self.hops {
            write!(f, " -{}:{}-> {:?}", hop.venue, hop.action, hop.token_out)?;
        }
        write!(f, ")")
    }
}

impl Cycle {
    /// Builds a cycle from `start` through `venues`, deriving each hop's action
    /// from the token walk.
    ///
    /// # Errors
    ///
    /// * If there are fewer than 2 or more than 4 venues
    /// * If a venue is unknown or repeated
    /// * If a venue does not trade the token the walk arrives with
    /// * If the walk does not end at `start`
    pub fn new(start: TokenId, venues: &[VenueId], registry: &VenueRegistry) -> Result<Self> {
        if venues.len() < MIN_HOPS {
            bail!("Cycle must have at least {MIN_HOPS} hops");
        }
        if venues.len() > MAX_HOPS {
            bail!("Cycle must have at most {MAX_HOPS} hops");
        }

        let mut seen = HashSet::with_capacity(venues.len());
        let mut hops = Vec::with_capacity(venues.len());
        let mut token = start;
        for (i, id) in venues.iter().enumerate() {
            if !seen.insert(*id) {
                bail!("Cycle contains venue {id} twice");
            }
            let Some(venue) = registry.get(*id) else {
                bail!("Unknown venue {id}");
            };
            let Some(action) = venue.action_for(token) else {
                bail!("Hop {i} venue {id} does not trade {token}");
            };
            let (token_in, token_out) = venue.tokens_for(action);
            hops.push(Hop {
                venue: *id,
                action,
                token_in,
                token_out,
            });
            token = token_out;
        }

        if token != start {
            bail!("Cycle ends at {token} instead of {start}");
        }
        Ok(Self { start, hops })
    }

    /// Number of hops
    #[must_use]
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Always false, a cycle has at least two hops
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Venue ids in trading order
    pub fn venues(&self) -> impl Iterator<Item = VenueId> + '_ {
        self.hops.iter().map(|hop| hop.venue)
    }

    /// Whether the cycle swaps through `venue`
    #[must_use]
    pub fn contains(&self, venue: VenueId) -> bool {
        self.hops.iter().any(|hop| hop.venue == venue)
    }

    /// Whether every venue of the cycle can currently return anything
    #[must_use]
    pub fn has_liquidity(&self, registry: &VenueRegistry) -> bool {
        self.venues().all(|id| registry.has_liquidity(id))
    }

    /// Whether any hop goes through a concentrated-liquidity venue
    #[must_use]
    pub fn has_concentrated(&self, registry: &VenueRegistry) -> bool {
        self.venues().any(|id| {
            registry
                .get(id)
                .is_some_and(|venue| venue.protocol() == Protocol::ConcentratedLiquidity)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::*;

    fn market() -> VenueRegistry {
        registry(vec![
            cp_venue(1, "A", "B", 100, 200),
            cp_venue(2, "B", "A", 300, 100),
            cp_venue(3, "B", "C", 300, 100),
            cp_venue(4, "C", "A", 300, 100),
            cl_venue(5, "A", "B", stepped_state()),
        ])
    }

    #[test]
    fn test_new_derives_actions() {
        let registry = market();
        let forward = cycle(&registry, "A", &[0, 2, 3]);
        assert_eq!(forward.len(), 3);
        assert_eq!(
            forward.hops.iter().map(|hop| hop.action).collect::<Vec<_>>(),
            vec![Action::Sell, Action::Sell, Action::Sell]
        );
        let back = cycle(&registry, "A", &[3, 2, 0]);
        assert_eq!(
            back.hops.iter().map(|hop| hop.action).collect::<Vec<_>>(),
            vec![Action::Buy, Action::Buy, Action::Buy]
        );
        assert_eq!(back.hops[0].token_in, token("A"));
        assert_eq!(back.hops[0].token_out, token("C"));
        assert!(back.contains(VenueId(2)));
        assert!(!back.contains(VenueId(1)));
    }

    #[test]
    fn test_new_invalid_length() {
        let registry = market();
        let cycle = Cycle::new(token("A"), &[VenueId(0)], &registry);
        assert_eq!(
            cycle.err().unwrap().to_string(),
            "Cycle must have at least 2 hops"
        );
        let ids = [VenueId(0), VenueId(1), VenueId(0), VenueId(1), VenueId(0)];
        let cycle = Cycle::new(token("A"), &ids, &registry);
        assert_eq!(
            cycle.err().unwrap().to_string(),
            "Cycle must have at most 4 hops"
        );
    }

    #[test]
    fn test_new_invalid_duplicate_venues() {
        let registry = market();
        let cycle = Cycle::new(token("A"), &[VenueId(0), VenueId(0)], &registry);
        assert_eq!(
            cycle.err().unwrap().to_string(),
            "Cycle contains venue #0 twice"
        );
    }

    #[test]
    fn test_new_invalid_token_mismatch() {
        let registry = market();
        let cycle = Cycle::new(token("A"), &[VenueId(0), VenueId(3)], &registry);
        assert_eq!(
            cycle.err().unwrap().to_string(),
            format!("Hop 1 venue #3 does not trade {}", token("B"))
        );
        let cycle = Cycle::new(token("A"), &[VenueId(0), VenueId(2)], &registry);
        assert_eq!(
            cycle.err().unwrap().to_string(),
            format!("Cycle ends at {} instead of {}", token("C"), token("A"))
        );
        let cycle = Cycle::new(token("A"), &[VenueId(0), VenueId(9)], &registry);
        assert_eq!(cycle.err().unwrap().to_string(), "Unknown venue #9");
    }

    #[test]
    fn test_protocol_queries() {
        let registry = market();
        assert!(!cycle(&registry, "A", &[0, 1]).has_concentrated(&registry));
        assert!(cycle(&registry, "A", &[4, 1]).has_concentrated(&registry));
        assert!(cycle(&registry, "A", &[4, 1]).has_liquidity(&registry));
    }

    #[test]
    fn test_debug_lists_hops() {
        let registry = market();
        let cycle = cycle(&registry, "A", &[0, 1]);
        assert_eq!(
            format!("{cycle:?}"),
            format!(
                "Cycle({:?} -#0:sell-> {:?} -#1:sell-> {:?})",
                token("A"),
                token("B"),
                token("A")
            )
        );
    }
}
