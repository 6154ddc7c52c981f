//! Library half of the `ecn` command-line tool.
//!
//! Configuration, the snapshot-backed state file and the command
//! implementations live here so they can be tested without spawning the
//! binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

pub use commands::{execute, Command};
pub use config::EcnConfig;
pub use error::CliError;
pub use state::StateFile;
