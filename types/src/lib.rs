//! Fundamental types for the energy certificate registry.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! holder addresses, certificate identifiers, energy categories, timestamps and
//! the clock seam used to stamp issuance and retirement.

pub mod address;
pub mod category;
pub mod error;
pub mod id;
pub mod time;

pub use address::HolderAddress;
pub use category::EnergyCategory;
pub use error::TypeError;
pub use id::CertificateId;
pub use time::{Clock, SystemClock, Timestamp};
