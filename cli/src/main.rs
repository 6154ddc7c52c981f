//! `ecn`: operate an energy certificate registry kept in a snapshot file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ecn_cli::{execute, Command, EcnConfig};
use ecn_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "ecn", about = "Energy certificate registry tool")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ECN_CONFIG")]
    config: Option<PathBuf>,

    /// Registry snapshot file.
    #[arg(long, env = "ECN_STATE_PATH")]
    state: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ECN_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ECN_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EcnConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EcnConfig::default(),
    };
    if let Some(state) = cli.state {
        config.state_path = state;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level);
    tracing::debug!(state = %config.state_path.display(), "configuration resolved");

    let output = execute(&config, cli.command)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
