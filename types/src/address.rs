//! Holder address type with `0x` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A 20-byte account identity: certificate holders, suppliers, buyers and
/// the administrator all share this type.
///
/// Written as `0x` followed by 40 hex digits. Parsing accepts either case,
/// display is always lowercase. The all-zero address is the null identity
/// and can never receive a certificate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HolderAddress([u8; 20]);

impl HolderAddress {
    /// The standard prefix for all holder addresses.
    pub const PREFIX: &'static str = "0x";

    /// The null identity.
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse an address from its `0x`-prefixed hex form.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidAddress {
            input: raw.to_string(),
            reason: reason.to_string(),
        };
        let digits = raw
            .strip_prefix(Self::PREFIX)
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| invalid("missing 0x prefix"))?;
        if digits.len() != 40 {
            return Err(invalid("expected 40 hex digits"));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for HolderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for HolderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HolderAddress({})", self)
    }
}

impl FromStr for HolderAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HolderAddress {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<HolderAddress> for String {
    fn from(address: HolderAddress) -> Self {
        address.to_string()
    }
}
