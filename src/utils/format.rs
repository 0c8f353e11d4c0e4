use alloy::primitives::U256;
use bigdecimal::BigDecimal;

use crate::arb::segment::to_big;

/// Decimals assumed when a token's decimals are unknown
pub const DEFAULT_DECIMALS: u32 = 18;

/// Formats a raw token amount as a decimal number with six fractional digits.
///
/// # Arguments
/// * `amount` - Amount in the token's smallest unit
/// * `decimals` - Token decimals
///
/// # Returns
/// * `String` - e.g. `1.500000` for 1.5e18 with 18 decimals
#[must_use]
pub fn format_amount(amount: U256, decimals: u32) -> String {
    BigDecimal::new(to_big(amount), i64::from(decimals))
        .with_scale(6)
        .to_string()
}
