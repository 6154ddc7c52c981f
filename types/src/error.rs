//! Errors raised while parsing fundamental types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid holder address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("invalid certificate id {0:?}")]
    InvalidCertificateId(String),
}
