//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the registry (the clock, event subscribers) are
//! abstracted behind traits or callbacks. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record what happened so tests can assert on it
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod events;

pub use clock::NullClock;
pub use events::EventRecorder;
