// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use rpcbus_client_rs::{
    cfg::config::Config,
    client::creds::CredentialsSupplier,
};

#[test]
fn loads_and_validates_the_test_config() -> Result<()> {
    let cfg = Config::load_from_file("tests/config.yaml")?;
    assert_eq!(cfg.connection.server_address, "127.0.0.1:6021");
    assert_eq!(cfg.connection.connect_timeout_ms, 2000);
    assert_eq!(cfg.auth.username(), "alice");
    assert_eq!(cfg.auth.password(), "secret");
    assert_eq!(cfg.auth.max_retries(), 2);
    Ok(())
}

#[test]
fn defaults_fill_in_optional_fields() -> Result<()> {
    let cfg: Config = serde_yaml::from_str(
        r#"
connection:
  ServerAddress: "bus.internal:6021"
auth:
  Username: "svc"
  Password: "pw"
"#,
    )?;
    cfg.validate()?;
    assert_eq!(cfg.connection.connect_timeout_ms, 5000);
    assert_eq!(cfg.auth.max_retries, 2);
    Ok(())
}

#[test]
fn oversize_credentials_fail_validation() -> Result<()> {
    let mut cfg = Config::load_from_file("tests/config.yaml")?;
    cfg.auth.username = "u".repeat(32);
    assert!(cfg.validate().is_err());

    let mut cfg = Config::load_from_file("tests/config.yaml")?;
    cfg.auth.password = "p".repeat(64);
    assert!(cfg.validate().is_err());

    let mut cfg = Config::load_from_file("tests/config.yaml")?;
    cfg.connection.server_address.clear();
    assert!(cfg.validate().is_err());
    Ok(())
}
