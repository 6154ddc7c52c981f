//! Registry snapshots for persistence.
//!
//! Only authoritative state is stored: certificate records, approvals, the
//! administrator and the lifecycle state. The owner index and the active
//! offset ledger are derived data and are rebuilt on restore, then checked
//! against a full recomputation before the registry is handed back.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use ecn_accounting::OffsetLedger;
use ecn_types::{CertificateId, Clock, HolderAddress};
use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;
use crate::error::RegistryError;
use crate::event::EventBus;
use crate::guard::{LifecycleGuard, LifecycleState};
use crate::registry::CertificateRegistry;

/// Serialisable registry state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub name: String,
    pub symbol: String,
    pub admin: HolderAddress,
    pub state: LifecycleState,
    /// Certificates in id order.
    pub certificates: Vec<Certificate>,
    pub token_approvals: Vec<(CertificateId, HolderAddress)>,
    /// `(owner, operator)` pairs.
    pub operators: Vec<(HolderAddress, HolderAddress)>,
}

impl RegistrySnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        bincode::serialize(self).map_err(|e| RegistryError::Snapshot(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, RegistryError> {
        bincode::deserialize(data).map_err(|e| RegistryError::Snapshot(e.to_string()))
    }
}

impl CertificateRegistry {
    /// Capture the authoritative state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut token_approvals: Vec<_> = self
            .token_approvals
            .iter()
            .map(|(id, d)| (*id, *d))
            .collect();
        token_approvals.sort();
        let mut operators: Vec<_> = self
            .operators
            .iter()
            .flat_map(|(owner, ops)| ops.iter().map(move |op| (*owner, *op)))
            .collect();
        operators.sort();
        RegistrySnapshot {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            admin: *self.guard.admin(),
            state: self.guard.state(),
            certificates: self.certificates.values().cloned().collect(),
            token_approvals,
            operators,
        }
    }

    /// Rebuild a registry from a snapshot.
    ///
    /// Rejects snapshots whose ids are not exactly `1..=n`, whose approvals
    /// reference unknown certificates, or whose zero-address fields could not
    /// have been produced by a live registry. Event listeners are not part of
    /// a snapshot; subscribe again after restoring.
    pub fn restore(
        snapshot: RegistrySnapshot,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RegistryError> {
        let guard = LifecycleGuard::with_state(snapshot.admin, snapshot.state)?;
        let mut certificates = BTreeMap::new();
        let mut owned: HashMap<HolderAddress, BTreeSet<CertificateId>> = HashMap::new();
        let mut offsets = OffsetLedger::new();
        let mut next_id = CertificateId::FIRST;

        for certificate in snapshot.certificates {
            if certificate.id != next_id {
                return Err(RegistryError::Snapshot(format!(
                    "expected certificate {next_id}, found {}",
                    certificate.id
                )));
            }
            if certificate.holder.is_zero() {
                return Err(RegistryError::Snapshot(format!(
                    "certificate {} is held by the zero address",
                    certificate.id
                )));
            }
            if !certificate.retired {
                offsets.credit(&certificate.holder, certificate.carbon_offset)?;
            }
            owned.entry(certificate.holder).or_default().insert(certificate.id);
            next_id = next_id
                .checked_next()
                .ok_or(RegistryError::IdSpaceExhausted)?;
            certificates.insert(certificate.id, certificate);
        }

        let mut token_approvals = HashMap::new();
        for (id, delegate) in snapshot.token_approvals {
            let Some(certificate) = certificates.get(&id) else {
                return Err(RegistryError::Snapshot(format!(
                    "approval references unknown certificate {id}"
                )));
            };
            if certificate.holder == delegate {
                return Err(RegistryError::ApprovalToOwner(id));
            }
            token_approvals.insert(id, delegate);
        }

        let mut operators: HashMap<HolderAddress, BTreeSet<HolderAddress>> = HashMap::new();
        for (owner, operator) in snapshot.operators {
            if operator.is_zero() {
                return Err(RegistryError::InvalidOperator);
            }
            if operator == owner {
                return Err(RegistryError::ApprovalToCaller);
            }
            operators.entry(owner).or_default().insert(operator);
        }

        let registry = Self {
            name: snapshot.name,
            symbol: snapshot.symbol,
            guard,
            certificates,
            owned,
            token_approvals,
            operators,
            offsets,
            next_id,
            events: EventBus::new(),
            outbox: None,
            failed_deliveries: 0,
            clock,
        };
        registry.verify_accounting()?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::IssueRequest;
    use ecn_types::{EnergyCategory, SystemClock};

    fn addr(n: u8) -> HolderAddress {
        HolderAddress::new([n; 20])
    }

    fn populated() -> CertificateRegistry {
        let admin = addr(0xAD);
        let mut reg = CertificateRegistry::new(admin, Arc::new(SystemClock))
            .unwrap()
            .with_collection("Test Certificates", "TST");
        for (holder, kwh, cat) in [(1u8, 1000u64, "solar"), (1, 2000, "wind"), (2, 700, "geothermal")] {
            reg.issue(
                &admin,
                IssueRequest {
                    recipient: addr(holder),
                    buyer: addr(holder),
                    supplier: addr(0x50),
                    energy_amount_kwh: kwh,
                    category: EnergyCategory::from_label(cat),
                    location: format!("site {holder}"),
                    descriptor_uri: String::new(),
                },
            )
            .unwrap();
        }
        reg.retire(&addr(1), CertificateId::FIRST).unwrap();
        reg.approve(&addr(2), CertificateId::new(3), Some(addr(4))).unwrap();
        reg.set_approval_for_all(&addr(1), &addr(5), true).unwrap();
        reg.suspend(&admin).unwrap();
        reg
    }

    #[test]
    fn restore_rebuilds_derived_state() {
        let reg = populated();
        let bytes = reg.snapshot().to_bytes().unwrap();
        let restored =
            CertificateRegistry::restore(RegistrySnapshot::from_bytes(&bytes).unwrap(), Arc::new(SystemClock))
                .unwrap();

        assert_eq!(restored.name(), "Test Certificates");
        assert_eq!(restored.symbol(), "TST");
        assert!(restored.is_suspended());
        assert_eq!(restored.total_issued(), 3);
        assert_eq!(restored.active_offset_total(&addr(1)), 22);
        assert_eq!(restored.active_offset_total(&addr(2)), 280);
        assert_eq!(restored.certificates_of(&addr(1)), vec![CertificateId::new(1), CertificateId::new(2)]);
        assert_eq!(restored.approved(CertificateId::new(3)).unwrap(), Some(addr(4)));
        assert!(restored.is_approved_for_all(&addr(1), &addr(5)));
        assert_eq!(restored.snapshot(), reg.snapshot());
    }

    #[test]
    fn restored_registry_continues_id_sequence() {
        let mut restored = CertificateRegistry::restore(populated().snapshot(), Arc::new(SystemClock)).unwrap();
        let admin = addr(0xAD);
        restored.resume(&admin).unwrap();
        let id = restored
            .issue(
                &admin,
                IssueRequest {
                    recipient: addr(3),
                    buyer: addr(3),
                    supplier: addr(0x50),
                    energy_amount_kwh: 1000,
                    category: EnergyCategory::Hydro,
                    location: "dam".into(),
                    descriptor_uri: String::new(),
                },
            )
            .unwrap();
        assert_eq!(id, CertificateId::new(4));
    }

    #[test]
    fn gap_in_ids_is_rejected() {
        let mut snapshot = populated().snapshot();
        snapshot.certificates.remove(1);
        assert!(matches!(
            CertificateRegistry::restore(snapshot, Arc::new(SystemClock)),
            Err(RegistryError::Snapshot(_))
        ));
    }

    #[test]
    fn dangling_approval_is_rejected() {
        let mut snapshot = populated().snapshot();
        snapshot.token_approvals.push((CertificateId::new(99), addr(7)));
        assert!(matches!(
            CertificateRegistry::restore(snapshot, Arc::new(SystemClock)),
            Err(RegistryError::Snapshot(_))
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            RegistrySnapshot::from_bytes(&[0xFF, 0x01, 0x02]),
            Err(RegistryError::Snapshot(_))
        ));
    }
}
