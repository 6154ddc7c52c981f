//! Certificate records.

use ecn_accounting::ledger::OffsetRecord;
use ecn_types::{CertificateId, EnergyCategory, HolderAddress, Timestamp};
use serde::{Deserialize, Serialize};

/// One issued certificate.
///
/// Everything except `holder`, `retired` and `retired_at` is fixed at
/// issuance. In particular `carbon_offset` is never recomputed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,

    /// Energy delivered, in kWh.
    pub energy_amount_kwh: u64,

    pub category: EnergyCategory,

    pub issued_at: Timestamp,

    pub supplier: HolderAddress,

    /// The buyer recorded on the underlying transaction.
    pub buyer: HolderAddress,

    /// Current owner.
    pub holder: HolderAddress,

    /// Free-text location or provenance of the generating site.
    pub location: String,

    /// Opaque reference to an off-chain descriptor document.
    pub descriptor_uri: String,

    /// Offset in tCO2e x 1000.
    pub carbon_offset: u64,

    pub retired: bool,

    pub retired_at: Option<Timestamp>,
}

impl OffsetRecord for Certificate {
    fn holder(&self) -> &HolderAddress {
        &self.holder
    }

    fn carbon_offset(&self) -> u64 {
        self.carbon_offset
    }

    fn is_retired(&self) -> bool {
        self.retired
    }
}

/// Everything the issuer supplies for a new certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    /// Initial holder of the certificate.
    pub recipient: HolderAddress,
    pub buyer: HolderAddress,
    pub supplier: HolderAddress,
    pub energy_amount_kwh: u64,
    pub category: EnergyCategory,
    pub location: String,
    #[serde(default)]
    pub descriptor_uri: String,
}
