// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    client::creds::CredentialsSupplier,
    protocol::{MAX_PASSWORD_LEN, MAX_USERNAME_LEN},
};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Where and how to reach the server.
    pub connection: ConnectionConfig,
    /// Credentials presented on the auth challenge.
    pub auth: AuthConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ConnectionConfig {
    #[serde(rename = "ServerAddress")]
    /// `host:port` of the message bus server.
    pub server_address: String,

    #[serde(default = "default_connect_timeout_ms", rename = "ConnectTimeoutMs")]
    /// How long to wait for the TCP connect.
    pub connect_timeout_ms: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AuthConfig {
    #[serde(rename = "Username")]
    pub username: String,

    #[serde(rename = "Password")]
    pub password: String,

    #[serde(default = "default_max_retries", rename = "MaxRetries")]
    /// Rejected logins are re-sent this many times before disconnecting.
    pub max_retries: u32,
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_max_retries() -> u32 {
    2
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path:?}"))?;
        let cfg: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {path:?}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.connection.server_address.is_empty(),
            "ServerAddress must not be empty"
        );
        ensure!(
            self.auth.username.len() < MAX_USERNAME_LEN,
            "Username must be shorter than {MAX_USERNAME_LEN} bytes"
        );
        ensure!(
            self.auth.password.len() < MAX_PASSWORD_LEN,
            "Password must be shorter than {MAX_PASSWORD_LEN} bytes"
        );
        Ok(())
    }
}

impl CredentialsSupplier for AuthConfig {
    fn username(&self) -> &str {
        &self.username
    }

    fn password(&self) -> &str {
        &self.password
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
