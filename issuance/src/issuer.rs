//! Issuance front end over a shared registry.

use ecn_accounting::compute_offset;
use ecn_registry::{Certificate, CertificateEvent, SharedRegistry};
use ecn_types::{CertificateId, HolderAddress};

use crate::descriptor::CertificateDescriptor;
use crate::error::IssuanceError;
use crate::trade::EnergyTrade;

/// What a successful issuance hands back.
#[derive(Clone, Debug)]
pub struct IssuanceReceipt {
    pub id: CertificateId,
    pub certificate: Certificate,
    pub descriptor: CertificateDescriptor,
    pub event: CertificateEvent,
}

/// Result for one entry of a batch, by input position.
#[derive(Debug)]
pub struct BatchOutcome {
    pub index: usize,
    pub result: Result<IssuanceReceipt, IssuanceError>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Issuer {
    registry: SharedRegistry,
    authority: HolderAddress,
}

impl Issuer {
    /// `authority` is the address issuance is performed as; the registry
    /// decides whether it is allowed.
    pub fn new(registry: SharedRegistry, authority: HolderAddress) -> Self {
        Self {
            registry,
            authority,
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Validate a trade, describe it and issue its certificate.
    ///
    /// The trade's own descriptor URI is used when given; otherwise the
    /// certificate points at the descriptor's content URI. The receipt's
    /// event is the one the registry emitted.
    pub fn issue_trade(&self, trade: &EnergyTrade) -> Result<IssuanceReceipt, IssuanceError> {
        let validated = trade.validate()?;
        let offset = compute_offset(validated.energy_amount_kwh, &validated.category);
        let descriptor = CertificateDescriptor::build(&validated, offset, self.registry.now());
        let uri = match &validated.descriptor_uri {
            Some(uri) => uri.clone(),
            None => descriptor.content_uri()?,
        };

        let (certificate, event) = self
            .registry
            .issue_certificate(&self.authority, validated.to_request(uri))?;
        Ok(IssuanceReceipt {
            id: certificate.id,
            certificate,
            descriptor,
            event,
        })
    }

    /// Issue each trade in order. A failure is recorded and the batch moves
    /// on; earlier successes are never undone.
    pub fn issue_batch(&self, trades: &[EnergyTrade]) -> Vec<BatchOutcome> {
        let outcomes: Vec<BatchOutcome> = trades
            .iter()
            .enumerate()
            .map(|(index, trade)| {
                let result = self.issue_trade(trade);
                if let Err(e) = &result {
                    tracing::warn!(index, error = %e, "batch entry rejected");
                }
                BatchOutcome { index, result }
            })
            .collect();

        let issued = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!(total = trades.len(), issued, "batch issuance complete");
        outcomes
    }
}
