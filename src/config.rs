//! Process configuration read from the environment (and `.env`).
//!
//! | Variable | Default |
//! |---|---|
//! | `NANGLE_START_TOKENS` | required, comma separated addresses |
//! | `NANGLE_HOP_COUNTS` | `2,3` |
//! | `NANGLE_FIXED_AMOUNTS` | none, `token:amount,extremum;token:amount` |
//! | `NANGLE_SNAPSHOT` | `snapshot.json` |
//! | `NANGLE_POLL_INTERVAL_MS` | `1000` |
//! | `NANGLE_BLACKLIST` | none, comma separated venue or token addresses |
//! | `NANGLE_MIN_PROFIT` | `0` |

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use eyre::{bail, eyre, Error, Report, Result, WrapErr};

use crate::arb::nangle::validate_hop_counts;
use crate::arb::registry::Blacklist;
use crate::arb::strategy::StartAmount;
use crate::arb::token::TokenId;

/// Start tokens variable
pub const START_TOKENS: &str = "NANGLE_START_TOKENS";
/// Hop counts variable
pub const HOP_COUNTS: &str = "NANGLE_HOP_COUNTS";
/// Fixed start amounts variable
pub const FIXED_AMOUNTS: &str = "NANGLE_FIXED_AMOUNTS";
/// Snapshot path variable
pub const SNAPSHOT: &str = "NANGLE_SNAPSHOT";
/// Poll interval variable
pub const POLL_INTERVAL_MS: &str = "NANGLE_POLL_INTERVAL_MS";
/// Blacklist variable
pub const BLACKLIST: &str = "NANGLE_BLACKLIST";
/// Minimum profit variable
pub const MIN_PROFIT: &str = "NANGLE_MIN_PROFIT";

/// Runtime settings for the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Tokens every cycle starts and ends with
    pub start_tokens: Vec<TokenId>,
    /// Cycle lengths to enumerate
    pub hop_counts: Vec<usize>,
    /// Starting amounts for the fixed-amount strategy, empty to disable it
    pub fixed_amounts: HashMap<TokenId, Vec<StartAmount>>,
    /// Snapshot file read by the provider
    pub snapshot: PathBuf,
    /// Delay between two polls in watch mode
    pub poll_interval: Duration,
    /// Venues and tokens never traded
    pub blacklist: Blacklist,
    /// Opportunities must earn strictly more than this
    pub min_profit: U256,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// * If `NANGLE_START_TOKENS` is not set
    /// * If any variable is malformed; the error names the variable
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns a variable's
    /// value if it is set.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let start_tokens = read(START_TOKENS)
            .ok_or_else(|| Error::msg(format!("{START_TOKENS} must be set")))
            .and_then(|value| parse_list::<TokenId>(&value))
            .wrap_err_with(|| format!("Invalid {START_TOKENS}"))?;
        if start_tokens.is_empty() {
            bail!("{START_TOKENS} must list at least one token");
        }

        let hop_counts = parse_list::<usize>(&read(HOP_COUNTS).unwrap_or_else(|| "2,3".to_string()))
            .and_then(|counts| validate_hop_counts(&counts).map(|()| counts))
            .wrap_err_with(|| format!("Invalid {HOP_COUNTS}"))?;

        let fixed_amounts = read(FIXED_AMOUNTS)
            .map(|value| parse_fixed_amounts(&value))
            .transpose()
            .wrap_err_with(|| format!("Invalid {FIXED_AMOUNTS}"))?
            .unwrap_or_default();

        let poll_interval = read(POLL_INTERVAL_MS)
            .map(|value| value.trim().parse::<u64>())
            .transpose()
            .wrap_err_with(|| format!("Invalid {POLL_INTERVAL_MS}"))?
            .unwrap_or(1000);

        let blacklisted = read(BLACKLIST)
            .map(|value| parse_list::<Address>(&value))
            .transpose()
            .wrap_err_with(|| format!("Invalid {BLACKLIST}"))?
            .unwrap_or_default();

        let min_profit = read(MIN_PROFIT)
            .map(|value| U256::from_str(value.trim()))
            .transpose()
            .wrap_err_with(|| format!("Invalid {MIN_PROFIT}"))?
            .unwrap_or(U256::ZERO);

        Ok(Self {
            start_tokens,
            hop_counts,
            fixed_amounts,
            snapshot: PathBuf::from(read(SNAPSHOT).unwrap_or_else(|| "snapshot.json".to_string())),
            poll_interval: Duration::from_millis(poll_interval),
            blacklist: Blacklist {
                venues: blacklisted.iter().copied().collect(),
                tokens: blacklisted.into_iter().map(TokenId).collect(),
            },
            min_profit,
        })
    }
}

/// Parses a comma separated list, ignoring empty items
fn parse_list<T>(value: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Into<Report>,
{
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>()
                .map_err(Into::into)
                .wrap_err_with(|| format!("Bad item {item:?}"))
        })
        .collect()
}

/// Parses `token:amount,extremum;token:amount`
fn parse_fixed_amounts(value: &str) -> Result<HashMap<TokenId, Vec<StartAmount>>> {
    let mut amounts: HashMap<TokenId, Vec<StartAmount>> = HashMap::new();
    for entry in value.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (token, list) = entry
            .split_once(':')
            .ok_or_else(|| eyre!("Entry {entry:?} must look like token:amount"))?;
        let token = TokenId::from_str(token)?;
        for item in list.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let amount = if item.eq_ignore_ascii_case("extremum") {
                StartAmount::Extremum
            } else {
                StartAmount::Fixed(
                    U256::from_str(item).wrap_err_with(|| format!("Bad amount {item:?} for {token}"))?,
                )
            };
            amounts.entry(token).or_default().push(amount);
        }
    }
    Ok(amounts)
}
