//! Venue snapshots stored as a JSON file.
//!
//! ```json
//! {
//!   "block_number": 120,
//!   "venues": [
//!     { "address": "0x..", "token0": "0x..", "token1": "0x..",
//!       "protocol": "constant_product", "reserve0": "1000", "reserve1": "2000" },
//!     { "address": "0x..", "token0": "0x..", "token1": "0x..",
//!       "protocol": "concentrated_liquidity", "sqrt_price_x96": "7922..", "liquidity": "10",
//!       "tick": 0, "fee": 3000, "tick_spacing": 60,
//!       "ticks": [{ "index": -60, "liquidity_net": "10" }, { "index": 60, "liquidity_net": "-10" }] }
//!   ]
//! }
//! ```
//!
//! Amounts are decimal strings since they overflow JSON numbers.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use eyre::{Result, WrapErr};
use log::{debug, error};
use serde::Deserialize;

use super::{StateBatch, VenueDiscovery, VenueStateProvider};
use crate::arb::amm::tick_list::Tick;
use crate::arb::token::TokenId;
use crate::arb::venue::{ConcentratedState, ConstantProductState, Venue, VenueState};

/// Top level of the snapshot file
#[derive(Debug, Deserialize)]
struct Snapshot {
    block_number: u64,
    venues: Vec<VenueRecord>,
}

/// One venue as written in the file
#[derive(Debug, Deserialize)]
struct VenueRecord {
    address: Address,
    token0: TokenId,
    token1: TokenId,
    #[serde(flatten)]
    state: StateRecord,
}

/// Protocol specific fields, tagged by `protocol`
#[derive(Debug, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
enum StateRecord {
    ConstantProduct {
        reserve0: String,
        reserve1: String,
    },
    ConcentratedLiquidity {
        sqrt_price_x96: String,
        liquidity: String,
        tick: i32,
        fee: u32,
        tick_spacing: i32,
        ticks: Vec<TickRecord>,
    },
}

#[derive(Debug, Deserialize)]
struct TickRecord {
    index: i32,
    liquidity_net: String,
}

/// Parses a decimal string field
fn parse<T: FromStr>(field: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .wrap_err_with(|| format!("Invalid {field}: {value:?}"))
}

impl StateRecord {
    fn to_state(&self) -> Result<VenueState> {
        Ok(match self {
            Self::ConstantProduct { reserve0, reserve1 } => {
                VenueState::ConstantProduct(ConstantProductState::new(
                    parse::<U256>("reserve0", reserve0)?,
                    parse::<U256>("reserve1", reserve1)?,
                ))
            }
            Self::ConcentratedLiquidity {
                sqrt_price_x96,
                liquidity,
                tick,
                fee,
                tick_spacing,
                ticks,
            } => VenueState::ConcentratedLiquidity(ConcentratedState {
                sqrt_price_x96: parse("sqrt_price_x96", sqrt_price_x96)?,
                liquidity: parse("liquidity", liquidity)?,
                tick: *tick,
                fee: *fee,
                tick_spacing: *tick_spacing,
                ticks: ticks
                    .iter()
                    .map(|tick| Ok(Tick::new(tick.index, parse("liquidity_net", &tick.liquidity_net)?)))
                    .collect::<Result<Vec<_>>>()?,
            }),
        })
    }
}

/// Reads venues and their states from a JSON snapshot file.
///
/// Every call re-reads the file, so an external process can keep rewriting
/// it. `poll` reports only states that differ from the last one it reported
/// for the venue and `discover` only venues it has not returned before.
/// Callers [`forget`](Self::forget) venues whose update they refused, so the
/// next poll offers the file's state again.
#[derive(Debug)]
pub struct SnapshotProvider {
    path: PathBuf,
    last: HashMap<Address, VenueState>,
    known: HashSet<Address>,
}

impl SnapshotProvider {
    /// Creates a provider for the file at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last: HashMap::new(),
            known: HashSet::new(),
        }
    }

    /// Path of the snapshot file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drops the last reported state of `addresses`
    pub fn forget<'a>(&mut self, addresses: impl IntoIterator<Item = &'a Address>) {
        for address in addresses {
            if self.last.remove(address).is_some() {
                debug!("Venue {address} will be reported again on the next poll");
            }
        }
    }

    fn load(&self) -> Result<Snapshot> {
        let json = fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("Failed to read snapshot {}", self.path.display()))?;
        serde_json::from_str(&json)
            .wrap_err_with(|| format!("Failed to parse snapshot {}", self.path.display()))
    }
}

impl VenueStateProvider for SnapshotProvider {
    fn poll(&mut self) -> Result<StateBatch> {
        let snapshot = self.load()?;
        let mut updates = Vec::new();
        for record in &snapshot.venues {
            let state = record
                .state
                .to_state()
                .wrap_err_with(|| format!("Venue {}", record.address))?;
            if self.last.get(&record.address) != Some(&state) {
                self.last.insert(record.address, state.clone());
                updates.push((record.address, state));
            }
        }
        debug!(
            "Snapshot block {}: {} of {} venues changed",
            snapshot.block_number,
            updates.len(),
            snapshot.venues.len()
        );
        Ok(StateBatch {
            block_number: snapshot.block_number,
            updates,
        })
    }
}

impl VenueDiscovery for SnapshotProvider {
    fn discover(&mut self) -> Result<Vec<Venue>> {
        let snapshot = self.load()?;
        let mut venues = Vec::new();
        for record in snapshot.venues {
            if self.known.contains(&record.address) {
                continue;
            }
            let venue = record
                .state
                .to_state()
                .and_then(|state| Venue::new(record.address, record.token0, record.token1, state));
            match venue {
                Ok(venue) => {
                    self.known.insert(record.address);
                    venues.push(venue);
                }
                Err(err) => error!("Skipping venue {}: {err:#}", record.address),
            }
        }
        Ok(venues)
    }
}
