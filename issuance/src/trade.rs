//! Raw energy-trade records and their validation.

use ecn_registry::IssueRequest;
use ecn_types::{EnergyCategory, HolderAddress};
use serde::{Deserialize, Serialize};

use crate::error::IssuanceError;

/// An energy trade as it arrives from upstream settlement, before any
/// checking. Every field is optional so a malformed record still parses and
/// can be reported field by field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyTrade {
    pub energy_amount_kwh: Option<u64>,
    pub energy_type: Option<String>,
    pub supplier: Option<String>,
    pub buyer: Option<String>,
    /// Receives the certificate; the buyer when absent.
    pub recipient: Option<String>,
    pub location: Option<String>,
    /// Free text, carried into the descriptor only.
    pub timestamp: Option<String>,
    pub descriptor_uri: Option<String>,
}

/// A trade whose required fields are present and whose addresses parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedTrade {
    pub energy_amount_kwh: u64,
    pub category: EnergyCategory,
    pub supplier: HolderAddress,
    pub buyer: HolderAddress,
    pub recipient: HolderAddress,
    pub location: String,
    pub timestamp: Option<String>,
    pub descriptor_uri: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, IssuanceError> {
    present(value).ok_or(IssuanceError::MissingField(field))
}

fn address(value: &str, field: &'static str) -> Result<HolderAddress, IssuanceError> {
    HolderAddress::parse(value).map_err(|source| IssuanceError::InvalidAddress { field, source })
}

impl EnergyTrade {
    /// Check required fields and parse addresses.
    ///
    /// Amount and zero-address rules are left to the registry so there is
    /// one place that decides them.
    pub fn validate(&self) -> Result<ValidatedTrade, IssuanceError> {
        let energy_amount_kwh = self
            .energy_amount_kwh
            .ok_or(IssuanceError::MissingField("energy_amount_kwh"))?;
        let category = EnergyCategory::from_label(required(&self.energy_type, "energy_type")?);
        let supplier = address(required(&self.supplier, "supplier")?, "supplier")?;
        let buyer = address(required(&self.buyer, "buyer")?, "buyer")?;
        let recipient = match present(&self.recipient) {
            Some(r) => address(r, "recipient")?,
            None => buyer,
        };
        let location = required(&self.location, "location")?.to_string();

        Ok(ValidatedTrade {
            energy_amount_kwh,
            category,
            supplier,
            buyer,
            recipient,
            location,
            timestamp: present(&self.timestamp).map(str::to_string),
            descriptor_uri: present(&self.descriptor_uri).map(str::to_string),
        })
    }
}

impl ValidatedTrade {
    pub fn to_request(&self, descriptor_uri: String) -> IssueRequest {
        IssueRequest {
            recipient: self.recipient,
            buyer: self.buyer,
            supplier: self.supplier,
            energy_amount_kwh: self.energy_amount_kwh,
            category: self.category.clone(),
            location: self.location.clone(),
            descriptor_uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPLIER: &str = "0x5050505050505050505050505050505050505050";
    const BUYER: &str = "0x0101010101010101010101010101010101010101";

    fn trade() -> EnergyTrade {
        EnergyTrade {
            energy_amount_kwh: Some(1000),
            energy_type: Some("solar".into()),
            supplier: Some(SUPPLIER.into()),
            buyer: Some(BUYER.into()),
            location: Some("Seoul, South Korea".into()),
            ..Default::default()
        }
    }

    #[test]
    fn recipient_defaults_to_buyer() {
        let v = trade().validate().unwrap();
        assert_eq!(v.recipient, v.buyer);
        assert_eq!(v.category, EnergyCategory::Solar);
        assert_eq!(v.descriptor_uri, None);
    }

    #[test]
    fn explicit_recipient_wins() {
        let mut t = trade();
        t.recipient = Some("0x0202020202020202020202020202020202020202".into());
        let v = t.validate().unwrap();
        assert_eq!(v.recipient, HolderAddress::new([2; 20]));
        assert_eq!(v.buyer, HolderAddress::new([1; 20]));
    }

    #[test]
    fn missing_fields_are_named() {
        let mut t = trade();
        t.energy_amount_kwh = None;
        assert!(matches!(t.validate(), Err(IssuanceError::MissingField("energy_amount_kwh"))));

        let mut t = trade();
        t.location = Some("   ".into());
        assert!(matches!(t.validate(), Err(IssuanceError::MissingField("location"))));

        let mut t = trade();
        t.energy_type = None;
        assert!(matches!(t.validate(), Err(IssuanceError::MissingField("energy_type"))));
    }

    #[test]
    fn bad_address_reports_field() {
        let mut t = trade();
        t.supplier = Some("not-an-address".into());
        assert!(matches!(
            t.validate(),
            Err(IssuanceError::InvalidAddress { field: "supplier", .. })
        ));
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let mut t = trade();
        t.descriptor_uri = Some(" ".into());
        t.recipient = Some(String::new());
        let v = t.validate().unwrap();
        assert_eq!(v.descriptor_uri, None);
        assert_eq!(v.recipient, v.buyer);
    }

    #[test]
    fn deserialises_partial_json() {
        let t: EnergyTrade =
            serde_json::from_str(r#"{"energy_amount_kwh": 5, "energy_type": "wind"}"#).unwrap();
        assert_eq!(t.energy_amount_kwh, Some(5));
        assert_eq!(t.buyer, None);
    }

    #[test]
    fn request_carries_trade_fields() {
        let req = trade().validate().unwrap().to_request("ipfs://x".into());
        assert_eq!(req.energy_amount_kwh, 1000);
        assert_eq!(req.supplier, HolderAddress::new([0x50; 20]));
        assert_eq!(req.descriptor_uri, "ipfs://x");
    }
}
