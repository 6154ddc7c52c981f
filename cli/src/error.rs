use std::path::PathBuf;

use ecn_issuance::IssuanceError;
use ecn_registry::RegistryError;
use ecn_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no registry at {} (run `ecn init` first)", .0.display())]
    NotInitialised(PathBuf),

    #[error("registry already exists at {}", .0.display())]
    AlreadyInitialised(PathBuf),

    #[error("no administrator given (use --admin or set `admin` in the config file)")]
    MissingAdmin,

    #[error("cannot read trades from {}: {source}", path.display())]
    Trades {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot render output: {0}")]
    Render(#[source] serde_json::Error),

    #[error(transparent)]
    Address(#[from] TypeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Issuance(#[from] IssuanceError),
}
