/*!
 * # Nangle - cyclic arbitrage search over AMM venues
 *
 * Nangle enumerates closed trading cycles of 2 to 4 hops through
 * constant-product and concentrated-liquidity venues, and for every cycle
 * touched by a state change finds the starting amount with the largest
 * profit, quoted with the venues' exact integer math.
 *
 * ## Module Structure
 *
 * - `arb`: venues, cycles, quoting, the profit curve solver and strategies
 * - `provider`: where venue states come from
 * - `config`: environment configuration
 * - `utils`: logging and amount formatting
 */

/// Arbitrage search core
pub mod arb;
/// Environment configuration
pub mod config;
/// Venue discovery and state sources
pub mod provider;
/// Utility functions and helpers
pub mod utils;
