//! Off-chain descriptor documents.
//!
//! A descriptor is the JSON document a certificate's `descriptor_uri` points
//! at. It is built before issuance, so it never contains the certificate id.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ecn_accounting::format_offset;
use ecn_types::{EnergyCategory, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IssuanceError;
use crate::trade::ValidatedTrade;

type Blake2b256 = Blake2b<U32>;

/// Scheme prefix of content-addressed descriptor URIs.
pub const CONTENT_URI_SCHEME: &str = "blake2b:";

const DEFAULT_IMAGE: &str = "ipfs://QmDefaultEnergyIcon/default.png";

fn image_for(category: &EnergyCategory) -> &'static str {
    match category {
        EnergyCategory::Solar => "ipfs://QmSolarPanelIcon/solar.png",
        EnergyCategory::Wind => "ipfs://QmWindTurbineIcon/wind.png",
        EnergyCategory::Hydro => "ipfs://QmHydroIcon/hydro.png",
        EnergyCategory::Biomass => "ipfs://QmBiomassIcon/biomass.png",
        EnergyCategory::Other(_) => DEFAULT_IMAGE,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
}

impl Attribute {
    fn text(trait_type: &str, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: Value::String(value.into()),
            display_type: None,
        }
    }

    fn number(trait_type: &str, value: impl Into<Value>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: value.into(),
            display_type: Some("number".to_string()),
        }
    }

    /// Unix seconds, rendered as a date by descriptor viewers.
    fn date(trait_type: &str, at: Timestamp) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: at.as_secs().into(),
            display_type: Some("date".to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorProperties {
    pub category: String,
    pub subcategory: String,
    pub is_renewable: bool,
    pub certification_standard: String,
    /// Fixed-point, thousandths of a tonne.
    pub carbon_offset: u64,
    pub energy_amount_kwh: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CertificateDescriptor {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
    pub properties: DescriptorProperties,
}

impl CertificateDescriptor {
    /// Describe a validated trade. `carbon_offset` must be the value the
    /// registry will store for it; `described_at` stands in for the trade
    /// time when the trade carries none.
    ///
    /// Every certificate is described as renewable and RE100/CBAM
    /// compliant, whatever its category.
    pub fn build(trade: &ValidatedTrade, carbon_offset: u64, described_at: Timestamp) -> Self {
        let label = trade.category.label();
        let trade_time = match &trade.timestamp {
            Some(ts) => Attribute::text("Trade Time", ts.as_str()),
            None => Attribute::date("Trade Time", described_at),
        };
        let attributes = vec![
            Attribute::number("Energy (kWh)", trade.energy_amount_kwh),
            Attribute::text("Energy Type", label),
            trade_time,
            Attribute::text("Supplier", trade.supplier.to_string()),
            Attribute::text("Buyer", trade.buyer.to_string()),
            Attribute::text("Location", trade.location.as_str()),
            Attribute::text("Carbon Offset (tCO2e)", format_offset(carbon_offset)),
            Attribute::text("RE100 Compliance", "Certified"),
            Attribute::text("CBAM Compliance", "Compliant"),
        ];

        Self {
            name: format!("Energy Certificate: {} kWh {label}", trade.energy_amount_kwh),
            description: format!(
                "Certificate for {} kWh of {label} energy delivered by {} to {}",
                trade.energy_amount_kwh, trade.supplier, trade.buyer
            ),
            image: image_for(&trade.category).to_string(),
            attributes,
            properties: DescriptorProperties {
                category: "Energy Certificate".to_string(),
                subcategory: label.to_string(),
                is_renewable: true,
                certification_standard: "RE100".to_string(),
                carbon_offset,
                energy_amount_kwh: trade.energy_amount_kwh,
            },
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, IssuanceError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Hex Blake2b-256 digest of the compact JSON encoding.
    pub fn content_digest(&self) -> Result<String, IssuanceError> {
        let mut hasher = Blake2b256::new();
        hasher.update(self.to_json()?);
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn content_uri(&self) -> Result<String, IssuanceError> {
        Ok(format!("{CONTENT_URI_SCHEME}{}", self.content_digest()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecn_types::HolderAddress;

    const AT: Timestamp = Timestamp::new(1_705_312_200);

    fn trade(category: &str) -> ValidatedTrade {
        ValidatedTrade {
            energy_amount_kwh: 1000,
            category: EnergyCategory::from_label(category),
            supplier: HolderAddress::new([0x50; 20]),
            buyer: HolderAddress::new([1; 20]),
            recipient: HolderAddress::new([1; 20]),
            location: "Jeju".into(),
            timestamp: Some("2024-01-15T10:30:00Z".into()),
            descriptor_uri: None,
        }
    }

    #[test]
    fn image_follows_category() {
        assert_eq!(
            CertificateDescriptor::build(&trade("wind"), 11, AT).image,
            "ipfs://QmWindTurbineIcon/wind.png"
        );
        assert_eq!(CertificateDescriptor::build(&trade("tidal"), 400, AT).image, DEFAULT_IMAGE);
    }

    #[test]
    fn offset_is_rendered_in_tonnes() {
        let d = CertificateDescriptor::build(&trade("solar"), 466, AT);
        let attr = d
            .attributes
            .iter()
            .find(|a| a.trait_type == "Carbon Offset (tCO2e)")
            .unwrap();
        assert_eq!(attr.value, Value::String("0.466".into()));
        assert_eq!(d.properties.carbon_offset, 466);
        assert!(d.properties.is_renewable);
    }

    fn attribute<'a>(d: &'a CertificateDescriptor, trait_type: &str) -> &'a Attribute {
        d.attributes.iter().find(|a| a.trait_type == trait_type).unwrap()
    }

    #[test]
    fn every_category_is_described_as_renewable_and_compliant() {
        let d = CertificateDescriptor::build(&trade("geothermal"), 400, AT);
        assert!(d.properties.is_renewable);
        assert_eq!(d.properties.subcategory, "geothermal");
        assert_eq!(attribute(&d, "RE100 Compliance").value, "Certified");
        assert_eq!(attribute(&d, "CBAM Compliance").value, "Compliant");
    }

    #[test]
    fn trade_time_defaults_to_description_time() {
        let given = CertificateDescriptor::build(&trade("solar"), 466, AT);
        assert_eq!(attribute(&given, "Trade Time").value, "2024-01-15T10:30:00Z");
        assert_eq!(attribute(&given, "Trade Time").display_type, None);

        let mut untimed = trade("solar");
        untimed.timestamp = None;
        let d = CertificateDescriptor::build(&untimed, 466, AT);
        let time = attribute(&d, "Trade Time");
        assert_eq!(time.value, 1_705_312_200u64);
        assert_eq!(time.display_type.as_deref(), Some("date"));
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = CertificateDescriptor::build(&trade("solar"), 466, AT);
        let b = CertificateDescriptor::build(&trade("solar"), 466, AT);
        assert_eq!(a.content_digest().unwrap(), b.content_digest().unwrap());
        assert_eq!(a.content_digest().unwrap().len(), 64);

        let c = CertificateDescriptor::build(&trade("hydro"), 24, AT);
        assert_ne!(a.content_digest().unwrap(), c.content_digest().unwrap());
    }

    #[test]
    fn content_uri_uses_scheme() {
        let uri = CertificateDescriptor::build(&trade("solar"), 466, AT).content_uri().unwrap();
        assert!(uri.starts_with(CONTENT_URI_SCHEME));
        assert_eq!(uri.len(), CONTENT_URI_SCHEME.len() + 64);
    }

    #[test]
    fn json_round_trips() {
        let d = CertificateDescriptor::build(&trade("biomass"), 180, AT);
        let back: CertificateDescriptor = serde_json::from_slice(&d.to_json().unwrap()).unwrap();
        assert_eq!(back, d);
    }
}
