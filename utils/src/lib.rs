//! Shared utilities for the energy certificate workspace.

pub mod logging;

pub use logging::{init_logging, LogFormat};
