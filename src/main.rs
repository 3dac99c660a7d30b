// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::rc::Rc;

use anyhow::{Context, Result};
use rpcbus_client_rs::{
    cfg::{cli::config_path, config::Config, logger::init_logger},
    client::tcp::{connect_client, run_read_loop},
};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _init_logger = init_logger("config/logger.yaml")?;

    // Load config
    let cfg = Config::load_from_file(config_path("config/client.yaml"))
        .context("failed to load config")?;

    let (mut client, read) = connect_client(&cfg).await?;
    info!(server = %cfg.connection.server_address, "connected");

    // A trivial provider: answer every call with its own params.
    client.register_rpc_provider(
        "echo",
        Rc::new(|client, call| {
            let params = call.params().to_vec();
            client.send_rpc_result(call, &params)
        }),
        true,
    )?;

    run_read_loop(&mut client, read).await
}
