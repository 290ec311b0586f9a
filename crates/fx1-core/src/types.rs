//! Core type definitions for the FX1 ledger

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AddressParseError;

/// Account or contract address (20 bytes, `0x`-prefixed hex)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null address
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build an address whose last bytes hold `n` (handy for fixtures)
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the null address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 40 {
            return Err(AddressParseError::InvalidLength { len: digits.len() });
        }
        let bytes = hex::decode(digits).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// Token amount in base units (18 decimals)
pub type Amount = u128;

/// Native coin amount in base units (wei)
pub type NativeAmount = u128;

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// Constants
pub mod constants {
    use super::{Address, Amount};

    /// Token decimal places
    pub const DECIMALS: u8 = 18;

    /// One whole token in base units
    pub const TOKEN_UNIT: Amount = 1_000_000_000_000_000_000;

    /// Conventional burn sink (`0x…dEaD`), used for permanently locked pool shares
    pub const DEAD_ADDRESS: Address = Address([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
    ]);
}

/// Parse a decimal amount string (e.g. from an API request) into base units
pub fn parse_amount(s: &str) -> Result<Amount, std::num::ParseIntError> {
    s.trim().parse::<Amount>()
}
