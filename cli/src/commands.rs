//! Subcommand definitions and their execution against the state file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ecn_accounting::format_offset;
use ecn_issuance::{EnergyTrade, Issuer};
use ecn_registry::{CertificateRegistry, SharedRegistry};
use ecn_types::{CertificateId, HolderAddress, SystemClock};

use crate::config::EcnConfig;
use crate::error::CliError;
use crate::state::StateFile;

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Command {
    /// Create an empty registry.
    Init {
        /// Administrator address (falls back to `admin` in the config file).
        #[arg(long)]
        admin: Option<HolderAddress>,
    },

    /// Issue certificates, either one from flags or a batch from a JSON file.
    Issue {
        /// Address performing the issuance; must be the administrator.
        #[arg(long)]
        caller: HolderAddress,

        /// JSON array of trade records.
        #[arg(long, conflicts_with_all = ["kwh", "category", "supplier", "buyer", "recipient", "location", "descriptor_uri"])]
        trades: Option<PathBuf>,

        #[arg(long)]
        kwh: Option<u64>,

        /// Energy category label, e.g. "solar".
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        supplier: Option<String>,

        #[arg(long)]
        buyer: Option<String>,

        /// Receives the certificate; defaults to the buyer.
        #[arg(long)]
        recipient: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        descriptor_uri: Option<String>,
    },

    /// Move a certificate to a new holder.
    Transfer {
        #[arg(long)]
        caller: HolderAddress,
        #[arg(long)]
        id: CertificateId,
        #[arg(long)]
        from: HolderAddress,
        #[arg(long)]
        to: HolderAddress,
    },

    /// Set or clear the single-certificate delegate.
    Approve {
        #[arg(long)]
        caller: HolderAddress,
        #[arg(long)]
        id: CertificateId,
        /// Omit to clear the current delegate.
        #[arg(long)]
        delegate: Option<HolderAddress>,
    },

    /// Grant or revoke an operator over all of the caller's certificates.
    Operator {
        #[arg(long)]
        caller: HolderAddress,
        #[arg(long)]
        operator: HolderAddress,
        #[arg(long)]
        revoke: bool,
    },

    /// Permanently retire a certificate held by the caller.
    Retire {
        #[arg(long)]
        caller: HolderAddress,
        #[arg(long)]
        id: CertificateId,
    },

    /// Halt issuance and transfers.
    Suspend {
        #[arg(long)]
        caller: HolderAddress,
    },

    Resume {
        #[arg(long)]
        caller: HolderAddress,
    },

    /// Print a certificate as JSON.
    Show {
        #[arg(long)]
        id: CertificateId,
    },

    /// Print a holder's active carbon offset.
    Offset {
        #[arg(long)]
        holder: HolderAddress,
    },

    /// List the certificates a holder currently holds.
    List {
        #[arg(long)]
        holder: HolderAddress,
    },

    /// Recompute every holder's total and compare with the cached values.
    Verify,
}

/// Run one command and return what should be printed.
///
/// Mutating commands write the snapshot back only when they succeed, so a
/// rejected operation leaves the file untouched. Queries never write.
pub fn execute(config: &EcnConfig, command: Command) -> Result<String, CliError> {
    let state = StateFile::new(&config.state_path);

    if let Command::Init { admin } = command {
        return init(config, &state, admin);
    }

    let registry = SharedRegistry::new(state.load(Arc::new(SystemClock))?);
    let (output, changed) = match command {
        Command::Init { .. } => {
            return Err(CliError::AlreadyInitialised(state.path().to_path_buf()))
        }
        Command::Issue {
            caller,
            trades: Some(path),
            ..
        } => issue_batch(&registry, caller, &path)?,
        Command::Issue {
            caller,
            trades: None,
            kwh,
            category,
            supplier,
            buyer,
            recipient,
            location,
            descriptor_uri,
        } => {
            let trade = EnergyTrade {
                energy_amount_kwh: kwh,
                energy_type: category,
                supplier,
                buyer,
                recipient,
                location,
                timestamp: None,
                descriptor_uri,
            };
            let receipt = Issuer::new(registry.clone(), caller).issue_trade(&trade)?;
            let c = &receipt.certificate;
            (
                format!(
                    "issued {} to {} ({} tCO2e)",
                    c.id,
                    c.holder,
                    format_offset(c.carbon_offset)
                ),
                true,
            )
        }
        Command::Transfer {
            caller,
            id,
            from,
            to,
        } => {
            registry.transfer(&caller, id, &from, &to)?;
            (format!("transferred {id} from {from} to {to}"), true)
        }
        Command::Approve {
            caller,
            id,
            delegate,
        } => {
            registry.approve(&caller, id, delegate)?;
            let output = match delegate {
                Some(d) => format!("approved {d} for {id}"),
                None => format!("cleared approval for {id}"),
            };
            (output, true)
        }
        Command::Operator {
            caller,
            operator,
            revoke,
        } => {
            registry.set_approval_for_all(&caller, &operator, !revoke)?;
            let verb = if revoke { "revoked" } else { "granted" };
            (format!("{verb} operator {operator} for {caller}"), true)
        }
        Command::Retire { caller, id } => {
            registry.retire(&caller, id)?;
            (format!("retired {id}"), true)
        }
        Command::Suspend { caller } => {
            registry.suspend(&caller)?;
            ("registry suspended".to_string(), true)
        }
        Command::Resume { caller } => {
            registry.resume(&caller)?;
            ("registry resumed".to_string(), true)
        }
        Command::Show { id } => {
            let certificate = registry.get_certificate(id)?;
            let json = serde_json::to_string_pretty(&certificate).map_err(CliError::Render)?;
            (json, false)
        }
        Command::Offset { holder } => {
            let total = registry.active_offset_total(&holder);
            (format!("{holder}: {} tCO2e", format_offset(total)), false)
        }
        Command::List { holder } => {
            let ids = registry.read(|r| r.certificates_of(&holder));
            let lines: Vec<String> = ids.iter().map(ToString::to_string).collect();
            (lines.join("\n"), false)
        }
        Command::Verify => {
            let issued = registry.read(|r| {
                r.verify_accounting()?;
                Ok::<_, CliError>(r.total_issued())
            })?;
            (format!("ok: {issued} certificates, accounting consistent"), false)
        }
    };

    if changed {
        state.save(&registry.snapshot())?;
    }
    Ok(output)
}

fn init(config: &EcnConfig, state: &StateFile, admin: Option<HolderAddress>) -> Result<String, CliError> {
    if state.exists() {
        return Err(CliError::AlreadyInitialised(state.path().to_path_buf()));
    }
    let admin = match (admin, &config.admin) {
        (Some(a), _) => a,
        (None, Some(raw)) => HolderAddress::parse(raw)?,
        (None, None) => return Err(CliError::MissingAdmin),
    };
    let registry = CertificateRegistry::new(admin, Arc::new(SystemClock))?
        .with_collection(&config.collection_name, &config.collection_symbol);
    state.save(&registry.snapshot())?;
    tracing::info!(%admin, path = %state.path().display(), "registry initialised");
    Ok(format!(
        "initialised {} ({}) at {}",
        registry.name(),
        registry.symbol(),
        state.path().display()
    ))
}

/// Issue every trade in the file. Entries that fail are reported alongside
/// the successes; the snapshot is saved if anything was issued.
fn issue_batch(
    registry: &SharedRegistry,
    caller: HolderAddress,
    path: &Path,
) -> Result<(String, bool), CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let trades: Vec<EnergyTrade> =
        serde_json::from_str(&content).map_err(|source| CliError::Trades {
            path: path.to_path_buf(),
            source,
        })?;

    let outcomes = Issuer::new(registry.clone(), caller).issue_batch(&trades);
    let issued = outcomes.iter().filter(|o| o.is_success()).count();
    let mut lines: Vec<String> = outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(receipt) => format!("[{}] issued {}", o.index, receipt.id),
            Err(e) => format!("[{}] failed: {e}", o.index),
        })
        .collect();
    lines.push(format!("{issued} of {} issued", trades.len()));
    Ok((lines.join("\n"), issued > 0))
}
