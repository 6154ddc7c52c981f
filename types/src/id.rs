//! Certificate identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// Identity of an issued certificate.
///
/// Identifiers are dense and strictly increasing, starting at
/// [`CertificateId::FIRST`]. An identifier is consumed only by a successful
/// issuance and is never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CertificateId(u64);

impl CertificateId {
    pub const FIRST: Self = Self(1);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one, if the id space is not exhausted.
    pub fn checked_next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for CertificateId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#')
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidCertificateId(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_id_is_one() {
        assert_eq!(CertificateId::FIRST.as_u64(), 1);
        assert_eq!(CertificateId::FIRST.checked_next(), Some(CertificateId::new(2)));
        assert_eq!(CertificateId::new(u64::MAX).checked_next(), None);
    }

    #[test]
    fn parses_with_or_without_hash() {
        assert_eq!("7".parse::<CertificateId>().unwrap(), CertificateId::new(7));
        assert_eq!("#7".parse::<CertificateId>().unwrap(), CertificateId::new(7));
        assert!("seven".parse::<CertificateId>().is_err());
    }
}
