//! 512-bit intermediate multiplication and division.
//!
//! Every function returns `None` where the on-chain library would revert
//! (zero denominator or a result that does not fit in 256 bits).

use alloy::primitives::{U256, U512};

/// `floor(a * b / denominator)` with a full 512-bit intermediate product.
#[must_use]
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product = U512::from(a) * U512::from(b);
    let result = product / U512::from(denominator);
    U256::checked_from_limbs_slice(result.as_limbs())
}

/// `ceil(a * b / denominator)` with a full 512-bit intermediate product.
#[must_use]
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product = U512::from(a) * U512::from(b);
    let denominator = U512::from(denominator);
    let mut result = product / denominator;
    if !(product % denominator).is_zero() {
        result += U512::from(1u8);
    }
    U256::checked_from_limbs_slice(result.as_limbs())
}

/// `ceil(a / b)`.
#[must_use]
pub fn div_rounding_up(a: U256, b: U256) -> Option<U256> {
    if b.is_zero() {
        return None;
    }
    let quotient = a / b;
    if (a % b).is_zero() {
        Some(quotient)
    } else {
        Some(quotient + U256::from(1u8))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_exceeding_256_bit_intermediate() {
        let a = U256::MAX;
        let b = U256::from(3u8);
        let d = U256::from(6u8);
        assert_eq!(mul_div(a, b, d).unwrap(), U256::MAX / U256::from(2u8));
    }

    #[test]
    fn test_mul_div_rounding() {
        let seven = U256::from(7u8);
        let three = U256::from(3u8);
        assert_eq!(mul_div(seven, U256::from(1u8), three), Some(U256::from(2u8)));
        assert_eq!(
            mul_div_rounding_up(seven, U256::from(1u8), three),
            Some(U256::from(3u8))
        );
        assert_eq!(
            mul_div_rounding_up(U256::from(6u8), U256::from(1u8), three),
            Some(U256::from(2u8))
        );
    }

    #[test]
    fn test_mul_div_failures() {
        assert_eq!(mul_div(U256::from(1u8), U256::from(1u8), U256::ZERO), None);
        assert_eq!(mul_div(U256::MAX, U256::MAX, U256::from(1u8)), None);
        assert_eq!(div_rounding_up(U256::from(1u8), U256::ZERO), None);
        assert_eq!(
            div_rounding_up(U256::from(10u8), U256::from(4u8)),
            Some(U256::from(3u8))
        );
    }

    #[test]
    fn test_mul_div_result_must_fit_256_bits() {
        let two = U256::from(2u8);
        assert_eq!(mul_div(U256::MAX, two, two), Some(U256::MAX));
        assert_eq!(mul_div(U256::MAX, two, U256::from(1u8)), None);
        assert_eq!(mul_div_rounding_up(U256::MAX, U256::from(3u8), U256::from(3u8)), Some(U256::MAX));
        let almost = U256::MAX - U256::from(1u8);
        assert_eq!(mul_div(U256::MAX, almost, almost), Some(U256::MAX));
        assert_eq!(mul_div_rounding_up(U256::MAX, U256::MAX, almost), None);
    }
}
