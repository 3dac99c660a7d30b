// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use rpcbus_client_rs::protocol::{MESSAGE_SEPARATOR, directive_bytes};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

/// Reads one `0x1E`-terminated frame from the server side of the socket.
pub async fn read_frame(sock: &mut TcpStream) -> Vec<u8> {
    let mut frame = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        sock.read_exact(&mut byte)
            .await
            .expect("server side read failed");
        frame.push(byte[0]);
        if byte[0] == MESSAGE_SEPARATOR {
            return frame;
        }
    }
}

/// Writes a frame given in human directive notation.
pub async fn write_frame(sock: &mut TcpStream, human: &str) {
    sock.write_all(&directive_bytes(human))
        .await
        .expect("server side write failed");
}

/// Drains the socket until the peer closes it.
pub async fn read_until_eof(sock: &mut TcpStream) {
    let mut sink = [0u8; 256];
    loop {
        match sock.read(&mut sink).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {},
        }
    }
}
