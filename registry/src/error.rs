//! Registry errors.

use ecn_accounting::AccountingError;
use ecn_types::{CertificateId, HolderAddress};
use thiserror::Error;

use crate::guard::LifecycleState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("certificate {0} not found")]
    NotFound(CertificateId),

    #[error("{caller} is not authorized to {action}")]
    NotAuthorized {
        caller: HolderAddress,
        action: &'static str,
    },

    #[error("certificate {0} is already retired")]
    AlreadyRetired(CertificateId),

    #[error("registry is suspended")]
    SystemSuspended,

    #[error("recipient must not be the zero address")]
    InvalidRecipient,

    #[error("operator must not be the zero address")]
    InvalidOperator,

    #[error("certificate {0} cannot be approved to its own owner")]
    ApprovalToOwner(CertificateId),

    #[error("an owner cannot be its own operator")]
    ApprovalToCaller,

    #[error("administrator must not be the zero address")]
    InvalidAdministrator,

    #[error("energy amount must be non-zero")]
    InvalidEnergyAmount,

    #[error("certificate {id} is owned by {owner}, not {claimed}")]
    IncorrectOwner {
        id: CertificateId,
        claimed: HolderAddress,
        owner: HolderAddress,
    },

    #[error("registry is already {0}")]
    AlreadyInState(LifecycleState),

    #[error("certificate id space exhausted")]
    IdSpaceExhausted,

    #[error("active offset of {holder} is {cached} but certificates sum to {recomputed}")]
    AccountingMismatch {
        holder: HolderAddress,
        cached: u64,
        recomputed: u64,
    },

    #[error("accounting error: {0}")]
    Accounting(#[from] AccountingError),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}
