// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{rc::Rc, time::Duration};

use anyhow::Result;
use rpcbus_client_rs::{
    client::{
        client::BusClient,
        creds::StaticCredentials,
        tcp::{TcpTransport, run_read_loop},
    },
    protocol::directive_bytes,
};
use tokio::{net::TcpListener, time::timeout};

use crate::integration_tests::common::{read_frame, write_frame};

/// Full round trip over a real socket pair: challenge, auth, provider
/// advertisement, one RPC with ack and in-place response, then EOF.
#[tokio::test]
async fn login_advertise_and_echo_round_trip() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.expect("accept failed");

        write_frame(&mut sock, "C|A+").await;
        let auth = read_frame(&mut sock).await;
        assert!(auth.starts_with(&directive_bytes("A|REQ|")));
        assert!(auth.ends_with(&[0x1E]));

        write_frame(&mut sock, "A|A+").await;
        let provide = read_frame(&mut sock).await;
        assert_eq!(provide, directive_bytes("P|S|echo+"));

        write_frame(&mut sock, "P|REQ|echo|u1|\"hi\"+").await;
        let ack = read_frame(&mut sock).await;
        assert_eq!(ack, directive_bytes("P|A|echo|u1+"));
        let response = read_frame(&mut sock).await;
        assert_eq!(response, directive_bytes("P|RES|echo|u1|S\"hi\"+"));
        // dropping the socket sends FIN and ends the client's read loop
    });

    let (transport, read) = TcpTransport::connect(&addr.to_string(), Duration::from_secs(5)).await?;
    let mut client = BusClient::new(transport, StaticCredentials::new("alice", "secret"));
    client.register_rpc_provider(
        "echo",
        Rc::new(|client, call| {
            let params = call.params().to_vec();
            client.send_rpc_result(call, &params)
        }),
        true,
    )?;

    timeout(Duration::from_secs(10), run_read_loop(&mut client, read)).await??;
    assert!(!client.is_ready()); // the close cleared readiness

    server.await?;
    Ok(())
}
