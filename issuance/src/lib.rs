//! Issuance orchestration.
//!
//! Sits in front of the registry: turns raw energy-trade records into
//! validated issue requests, builds the descriptor document each certificate
//! points at, and reports the issued id and event back to the caller.
//! Uploading or pinning descriptors is someone else's job; when a trade has
//! no descriptor reference, the document's content digest is used instead.

pub mod descriptor;
pub mod error;
pub mod issuer;
pub mod trade;

pub use descriptor::{Attribute, CertificateDescriptor, DescriptorProperties};
pub use error::IssuanceError;
pub use issuer::{BatchOutcome, IssuanceReceipt, Issuer};
pub use trade::{EnergyTrade, ValidatedTrade};
