// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::path::PathBuf;

/// Environment variable that overrides the default config location.
pub const CONFIG_ENV: &str = "RPCBUS_CONFIG";

/// Picks the config file to load: `RPCBUS_CONFIG` from the environment
/// when set, otherwise `default`. Relative paths stay relative to the
/// working directory; whether the file exists is the loader's problem,
/// which reports the offending path in its error.
pub fn config_path(default: &str) -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
