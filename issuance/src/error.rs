//! Issuance-layer errors.

use ecn_registry::RegistryError;
use ecn_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("field `{field}` is not a valid address: {source}")]
    InvalidAddress {
        field: &'static str,
        #[source]
        source: TypeError,
    },

    #[error("registry rejected issuance: {0}")]
    Registry(#[from] RegistryError),

    #[error("descriptor encoding failed: {0}")]
    Descriptor(#[from] serde_json::Error),
}
