use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use alloy::primitives::Address;
use eyre::{Error, Result};
use serde::{Deserialize, Serialize};

/// A token identified by its contract address
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TokenId(pub Address);

impl TokenId {
    /// The underlying address
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for TokenId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl FromStr for TokenId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Ok(Self(Address::from_str(value.trim())?))
    }
}

impl Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps cycle dumps readable
        let hex = self.0.to_string();
        write!(f, "{}..{}", &hex[..6], &hex[hex.len() - 4..])
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let token = TokenId::from_str(" 0x4200000000000000000000000000000000000006 ").unwrap();
        assert_eq!(
            token.to_string(),
            "0x4200000000000000000000000000000000000006"
        );
        assert_eq!(format!("{token:?}"), "0x4200..0006");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(TokenId::from_str("0x42").is_err());
        assert!(TokenId::from_str("weth").is_err());
    }
}
