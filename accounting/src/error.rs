//! Accounting-specific errors.

use ecn_types::HolderAddress;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountingError {
    #[error("active offset total for {holder} would overflow")]
    TotalOverflow { holder: HolderAddress },

    #[error("cannot debit {amount} from {holder}: active total is {available}")]
    Underflow {
        holder: HolderAddress,
        amount: u64,
        available: u64,
    },
}
