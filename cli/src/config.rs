//! Tool configuration with TOML file support.

use std::path::{Path, PathBuf};

use ecn_registry::{DEFAULT_COLLECTION_NAME, DEFAULT_COLLECTION_SYMBOL};
use serde::{Deserialize, Serialize};

use crate::CliError;

/// Configuration for the `ecn` tool.
///
/// Loaded from a TOML file via [`EcnConfig::from_toml_file`]; command-line
/// flags and `ECN_*` environment variables override individual fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcnConfig {
    /// Registry snapshot file.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Administrator used by `init` when `--admin` is not given.
    #[serde(default)]
    pub admin: Option<String>,

    /// Collection name recorded at `init`.
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    #[serde(default = "default_collection_symbol")]
    pub collection_symbol: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("./ecn_state.bin")
}

fn default_collection_name() -> String {
    DEFAULT_COLLECTION_NAME.to_string()
}

fn default_collection_symbol() -> String {
    DEFAULT_COLLECTION_SYMBOL.to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EcnConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, CliError> {
        toml::from_str(s).map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, CliError> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(e.to_string()))
    }
}

impl Default for EcnConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            admin: None,
            collection_name: default_collection_name(),
            collection_symbol: default_collection_symbol(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
