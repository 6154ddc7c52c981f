//! Carbon accounting for energy certificates.
//!
//! Offsets are fixed-point integers scaled by [`OFFSET_SCALE`] relative to one
//! tonne of CO2-equivalent. They are derived once at issuance from the energy
//! amount (kWh) and the source category, then never recomputed.
//!
//! The [`OffsetLedger`] keeps a running active total per holder so aggregate
//! queries are O(1); [`recompute_total`] is the from-scratch scan it must
//! always agree with.

pub mod error;
pub mod factor;
pub mod ledger;

pub use error::AccountingError;
pub use factor::{compute_offset, factor_milli, format_offset, OFFSET_SCALE};
pub use ledger::{recompute_total, OffsetLedger, OffsetRecord};
