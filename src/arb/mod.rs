//! # Arbitrage Module
//!
//! Venues live in a [`registry::VenueRegistry`] arena and cycles refer to
//! them by id. A change to a venue's state marks every cycle through it
//! dirty; each strategy then searches the dirty cycles for the most
//! profitable starting amount.

/// AMM swap math and the quote engine
pub mod amm;
/// Cycle definition and validation
pub mod cycle;
/// Exact quotes over a whole cycle
pub mod cycle_quote;
/// Cycle enumeration and the venue to cycle index
pub mod nangle;
/// Opportunities reported to callers
pub mod opportunity;
/// Runs strategies over changed venues
pub mod orchestrator;
/// Profit curve composition and the extremum solver
pub mod profit;
/// Venue arena
pub mod registry;
/// Linear-fractional swap segments
pub mod segment;
/// Ways of picking a starting amount
pub mod strategy;
/// Shared fixtures
#[cfg(test)]
pub(crate) mod test_helpers;
/// Token identifiers
pub mod token;
/// Venue identity and state
pub mod venue;
