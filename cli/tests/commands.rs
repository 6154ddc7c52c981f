//! Command execution against a state file in a temporary directory.

use ecn_cli::{execute, CliError, Command, EcnConfig};
use ecn_registry::RegistryError;
use ecn_types::{CertificateId, HolderAddress};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn addr(n: u8) -> HolderAddress {
    HolderAddress::new([n; 20])
}

fn admin() -> HolderAddress {
    addr(0xAD)
}

fn setup() -> (TempDir, EcnConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = EcnConfig {
        state_path: dir.path().join("state.bin"),
        ..EcnConfig::default()
    };
    execute(&config, Command::Init { admin: Some(admin()) }).unwrap();
    (dir, config)
}

fn issue(config: &EcnConfig, kwh: u64, category: &str, buyer: HolderAddress) -> Result<String, CliError> {
    execute(
        config,
        Command::Issue {
            caller: admin(),
            trades: None,
            kwh: Some(kwh),
            category: Some(category.into()),
            supplier: Some(addr(0x50).to_string()),
            buyer: Some(buyer.to_string()),
            recipient: None,
            location: Some("Seoul".into()),
            descriptor_uri: None,
        },
    )
}

fn offset(config: &EcnConfig, holder: HolderAddress) -> String {
    execute(config, Command::Offset { holder }).unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn init_twice_is_refused() {
    let (_dir, config) = setup();
    assert!(matches!(
        execute(&config, Command::Init { admin: Some(admin()) }),
        Err(CliError::AlreadyInitialised(_))
    ));
}

#[test]
fn init_uses_config_admin_and_collection() {
    let dir = tempfile::tempdir().unwrap();
    let config = EcnConfig {
        state_path: dir.path().join("state.bin"),
        admin: Some(admin().to_string()),
        collection_name: "Green Power".into(),
        collection_symbol: "GRN".into(),
        ..EcnConfig::default()
    };
    let out = execute(&config, Command::Init { admin: None }).unwrap();
    assert!(out.contains("Green Power (GRN)"));
    issue(&config, 1000, "solar", addr(1)).unwrap();
}

#[test]
fn init_without_admin_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = EcnConfig {
        state_path: dir.path().join("state.bin"),
        ..EcnConfig::default()
    };
    assert!(matches!(
        execute(&config, Command::Init { admin: None }),
        Err(CliError::MissingAdmin)
    ));
}

#[test]
fn commands_before_init_report_missing_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = EcnConfig {
        state_path: dir.path().join("state.bin"),
        ..EcnConfig::default()
    };
    assert!(matches!(
        execute(&config, Command::Verify),
        Err(CliError::NotInitialised(_))
    ));
}

#[test]
fn state_persists_across_invocations() {
    let (_dir, config) = setup();
    issue(&config, 1000, "solar", addr(1)).unwrap();
    issue(&config, 2000, "wind", addr(1)).unwrap();
    assert_eq!(offset(&config, addr(1)), format!("{}: 0.488 tCO2e", addr(1)));

    execute(
        &config,
        Command::Retire {
            caller: addr(1),
            id: CertificateId::FIRST,
        },
    )
    .unwrap();
    assert_eq!(offset(&config, addr(1)), format!("{}: 0.022 tCO2e", addr(1)));

    let listed = execute(&config, Command::List { holder: addr(1) }).unwrap();
    assert_eq!(listed, "#1\n#2");

    let verified = execute(&config, Command::Verify).unwrap();
    assert!(verified.starts_with("ok: 2 certificates"));
}

#[test]
fn rejected_command_leaves_file_untouched() {
    let (_dir, config) = setup();
    issue(&config, 1000, "solar", addr(1)).unwrap();
    let before = std::fs::read(&config.state_path).unwrap();

    let err = execute(
        &config,
        Command::Retire {
            caller: addr(2),
            id: CertificateId::FIRST,
        },
    )
    .unwrap_err();
    assert!(matches!(err, CliError::Registry(RegistryError::NotAuthorized { .. })));
    assert!(issue(&config, 0, "solar", addr(1)).is_err());

    assert_eq!(std::fs::read(&config.state_path).unwrap(), before);
}

#[test]
fn transfer_and_show() {
    let (_dir, config) = setup();
    issue(&config, 1500, "solar", addr(1)).unwrap();
    execute(
        &config,
        Command::Transfer {
            caller: addr(1),
            id: CertificateId::FIRST,
            from: addr(1),
            to: addr(2),
        },
    )
    .unwrap();

    let shown = execute(&config, Command::Show { id: CertificateId::FIRST }).unwrap();
    let json: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(json["holder"], addr(2).to_string());
    assert_eq!(json["buyer"], addr(1).to_string());
    assert_eq!(json["carbon_offset"], 699);
    assert_eq!(offset(&config, addr(2)), format!("{}: 0.699 tCO2e", addr(2)));
}

#[test]
fn suspension_persists() {
    let (_dir, config) = setup();
    execute(&config, Command::Suspend { caller: admin() }).unwrap();
    assert!(matches!(
        issue(&config, 1000, "solar", addr(1)),
        Err(CliError::Issuance(_))
    ));
    execute(&config, Command::Resume { caller: admin() }).unwrap();
    issue(&config, 1000, "solar", addr(1)).unwrap();
}

#[test]
fn batch_file_issues_valid_entries() {
    let (dir, config) = setup();
    let trades = dir.path().join("trades.json");
    std::fs::write(
        &trades,
        format!(
            r#"[
                {{"energy_amount_kwh": 1000, "energy_type": "solar", "supplier": "{s}", "buyer": "{b}", "location": "Seoul"}},
                {{"energy_amount_kwh": 1000, "energy_type": "wind", "supplier": "{s}", "location": "Jeju"}},
                {{"energy_amount_kwh": 1000, "energy_type": "geothermal", "supplier": "{s}", "buyer": "{b}", "location": "Pohang"}}
            ]"#,
            s = addr(0x50),
            b = addr(1)
        ),
    )
    .unwrap();

    let out = execute(
        &config,
        Command::Issue {
            caller: admin(),
            trades: Some(trades),
            kwh: None,
            category: None,
            supplier: None,
            buyer: None,
            recipient: None,
            location: None,
            descriptor_uri: None,
        },
    )
    .unwrap();
    assert!(out.contains("[0] issued #1"));
    assert!(out.contains("[1] failed"));
    assert!(out.contains("[2] issued #2"));
    assert!(out.ends_with("2 of 3 issued"));
    assert_eq!(offset(&config, addr(1)), format!("{}: 0.866 tCO2e", addr(1)));
}
