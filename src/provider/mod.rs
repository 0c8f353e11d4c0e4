//! # Providers
//!
//! Interfaces to the collaborators that feed the core: fresh venue states
//! each round, and venues that appear on-chain. The core never fetches
//! anything itself.

/// JSON snapshot file provider
pub mod snapshot;

use alloy::primitives::Address;
use eyre::Result;

use crate::arb::venue::{Venue, VenueState};

pub use snapshot::SnapshotProvider;

/// Venue states read at one block
#[derive(Debug, Clone, Default)]
pub struct StateBatch {
    /// Block the states were read at
    pub block_number: u64,
    /// New state per venue address, only for venues that changed
    pub updates: Vec<(Address, VenueState)>,
}

/// Supplies fresh venue states
pub trait VenueStateProvider {
    /// Reads the states that changed since the previous poll.
    ///
    /// # Errors
    ///
    /// If the source cannot be read or parsed.
    fn poll(&mut self) -> Result<StateBatch>;
}

/// Supplies venues not seen before
pub trait VenueDiscovery {
    /// Returns venues that appeared since the previous call.
    ///
    /// # Errors
    ///
    /// If the source cannot be read or parsed.
    fn discover(&mut self) -> Result<Vec<Venue>>;
}
