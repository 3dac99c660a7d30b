// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Credential supply for the authentication handshake.

use crate::protocol::{MAX_PASSWORD_LEN, MAX_USERNAME_LEN};

/// Supplies the values the client sends in reply to an auth challenge.
/// Implementors guarantee username and password stay under the wire
/// limits; the config loader enforces this at the boundary.
pub trait CredentialsSupplier {
    fn username(&self) -> &str;
    fn password(&self) -> &str;
    /// How many times a rejected login is retried before giving up.
    fn max_retries(&self) -> u32 {
        2
    }
}

/// Fixed in-memory credentials, mainly for tests and short-lived tools.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
    max_retries: u32,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let creds = Self {
            username: username.into(),
            password: password.into(),
            max_retries: 2,
        };
        assert!(
            creds.username.len() < MAX_USERNAME_LEN,
            "username must be shorter than {MAX_USERNAME_LEN} bytes"
        );
        assert!(
            creds.password.len() < MAX_PASSWORD_LEN,
            "password must be shorter than {MAX_PASSWORD_LEN} bytes"
        );
        creds
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl CredentialsSupplier for StaticCredentials {
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
