//! Events emitted after successful state transitions.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use ecn_types::{CertificateId, EnergyCategory, HolderAddress};
use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;

/// Registry-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CertificateEvent {
    /// A certificate was issued.
    Issued {
        id: CertificateId,
        supplier: HolderAddress,
        buyer: HolderAddress,
        holder: HolderAddress,
        energy_amount_kwh: u64,
        category: EnergyCategory,
        carbon_offset: u64,
    },
    /// Ownership moved.
    Transferred {
        id: CertificateId,
        from: HolderAddress,
        to: HolderAddress,
    },
    /// A single-certificate delegate was set or cleared.
    Approval {
        id: CertificateId,
        owner: HolderAddress,
        approved: Option<HolderAddress>,
    },
    /// An operator was granted or denied access to all of an owner's certificates.
    ApprovalForAll {
        owner: HolderAddress,
        operator: HolderAddress,
        approved: bool,
    },
    /// A certificate was retired by its holder.
    Retired {
        id: CertificateId,
        holder: HolderAddress,
    },
    Suspended {
        by: HolderAddress,
    },
    Resumed {
        by: HolderAddress,
    },
}

impl CertificateEvent {
    /// The issuance event for a freshly created certificate.
    pub fn issued(certificate: &Certificate) -> Self {
        Self::Issued {
            id: certificate.id,
            supplier: certificate.supplier,
            buyer: certificate.buyer,
            holder: certificate.holder,
            energy_amount_kwh: certificate.energy_amount_kwh,
            category: certificate.category.clone(),
            carbon_offset: certificate.carbon_offset,
        }
    }

    /// The certificate this event concerns, if any.
    pub fn certificate_id(&self) -> Option<CertificateId> {
        match self {
            Self::Issued { id, .. }
            | Self::Transferred { id, .. }
            | Self::Approval { id, .. }
            | Self::Retired { id, .. } => Some(*id),
            Self::ApprovalForAll { .. } | Self::Suspended { .. } | Self::Resumed { .. } => None,
        }
    }
}

type Listener = dyn Fn(&CertificateEvent) + Send + Sync;

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting thread, in subscription
/// order; keep handlers fast. A listener that panics is isolated: the
/// remaining listeners still receive the event and `emit` reports how many
/// deliveries failed.
#[derive(Clone)]
pub struct EventBus {
    listeners: Vec<Arc<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<Listener>) {
        self.listeners.push(Arc::from(listener));
    }

    /// Deliver `event` to every listener. Returns the number of listeners
    /// that panicked.
    pub fn emit(&self, event: &CertificateEvent) -> usize {
        self.listeners
            .iter()
            .filter(|listener| panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err())
            .count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Move every listener of `other` onto the end of this bus.
    pub(crate) fn append(&mut self, other: &mut EventBus) {
        self.listeners.append(&mut other.listeners);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
