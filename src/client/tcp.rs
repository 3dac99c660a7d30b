// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Tokio TCP implementation of the transport boundary.
//!
//! Writes are fire-and-forget: `send` enqueues the frame to a spawned
//! writer task and returns immediately. The writer performs the actual
//! `write_all` and then drops the queue node, which releases the frame
//! buffer back to the pool; that drop is the write-completion callback
//! of the C-style interface. The read side is a loop that splits the
//! byte stream on the message separator and feeds one owning buffer per
//! frame into the state machine.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use bytes::BytesMut;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    select,
    sync::mpsc,
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    cfg::config::Config,
    client::{client::BusClient, creds::CredentialsSupplier, transport::Transport},
    pool::{self, PooledBox, PooledBuf, TypedPool},
    protocol::MESSAGE_SEPARATOR,
};

/// Read scratch capacity; frames are far smaller in practice.
pub const RECV_BUF_SIZE: usize = 8192;

/// One queued outbound frame. Nodes are pooled so a chatty client does
/// not allocate per write.
struct PendingWrite {
    buf: PooledBuf,
}

static WRITE_NODES: TypedPool<PendingWrite> = TypedPool::new();

pub struct TcpTransport {
    queue: mpsc::UnboundedSender<PooledBox<'static, PendingWrite>>,
    cancel: CancellationToken,
}

impl TcpTransport {
    /// Connects to `addr` and returns the transport plus the read half
    /// for [`run_read_loop`].
    pub async fn connect(addr: &str, connect_timeout: Duration) -> Result<(Self, OwnedReadHalf)> {
        let stream = timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .with_context(|| format!("timed out connecting to {addr}"))?
            .with_context(|| format!("failed to connect to {addr}"))?;
        stream.set_nodelay(true)?;
        let (read, write) = stream.into_split();
        Ok((Self::from_write_half(write), read))
    }

    /// Wraps an already-connected write half, spawning the writer task.
    pub fn from_write_half(write: OwnedWriteHalf) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(write_loop(write, rx, cancel.clone()));
        Self { queue: tx, cancel }
    }

    /// Token cancelled by `disconnect`; the read driver selects on it.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Transport for TcpTransport {
    fn alloc_send_buffer(&mut self, size: usize) -> Option<PooledBuf> {
        pool::acquire(size)
    }

    fn send(&mut self, buf: PooledBuf) -> Result<()> {
        if self.cancel.is_cancelled() {
            bail!("transport is disconnected");
        }
        self.queue
            .send(WRITE_NODES.acquire(PendingWrite { buf }))
            .map_err(|_| anyhow!("writer task is gone"))
    }

    fn disconnect(&mut self) -> Result<()> {
        self.cancel.cancel();
        Ok(())
    }
}

async fn write_loop(
    mut write: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<PooledBox<'static, PendingWrite>>,
    cancel: CancellationToken,
) {
    loop {
        select! {
            _ = cancel.cancelled() => break,
            node = rx.recv() => match node {
                None => break,
                Some(node) => {
                    if let Err(e) = write.write_all(&node.buf).await {
                        warn!(error = %e, "frame write failed");
                    }
                    // dropping the node releases the frame buffer: this
                    // is the write-completion callback
                },
            },
        }
    }
    let _ = write.shutdown().await;
}

/// Drives `client` from the read half until disconnect, EOF or a read
/// error. One owning buffer is handed to the state machine per
/// `0x1E`-terminated message, terminator included. Frame-level errors
/// are logged and the loop continues; the connection only ends with the
/// transport.
pub async fn run_read_loop<CS: CredentialsSupplier>(
    client: &mut BusClient<TcpTransport, CS>,
    mut read: OwnedReadHalf,
) -> Result<()> {
    let cancel = client.transport().cancel_token();
    let mut scratch = BytesMut::with_capacity(RECV_BUF_SIZE);
    loop {
        select! {
            _ = cancel.cancelled() => {
                client.on_transport_closed();
                debug!("transport disconnected, read loop stopping");
                return Ok(());
            },
            read_result = read.read_buf(&mut scratch) => {
                let n = match read_result {
                    Ok(n) => n,
                    Err(e) => {
                        client.on_transport_closed();
                        return Err(e.into());
                    },
                };
                if n == 0 {
                    client.on_transport_closed();
                    debug!("server closed the connection");
                    return Ok(());
                }
                dispatch_frames(client, &mut scratch)?;
            },
        }
    }
}

fn dispatch_frames<CS: CredentialsSupplier>(
    client: &mut BusClient<TcpTransport, CS>,
    scratch: &mut BytesMut,
) -> Result<()> {
    while let Some(end) = scratch.iter().position(|&b| b == MESSAGE_SEPARATOR) {
        let frame = scratch.split_to(end + 1);
        let mut buf = pool::acquire(frame.len()).context("buffer pool exhausted")?;
        buf.fill_from(&frame);
        if let Err(e) = client.handle_server_directive(buf) {
            error!(error = %e, "failed to process server directive");
        }
    }
    Ok(())
}

/// Connects with the settings from `cfg` and builds a client whose
/// credentials come from the config's auth section.
pub async fn connect_client(
    cfg: &Config,
) -> Result<(BusClient<TcpTransport, crate::cfg::config::AuthConfig>, OwnedReadHalf)> {
    let (transport, read) = TcpTransport::connect(
        &cfg.connection.server_address,
        Duration::from_millis(cfg.connection.connect_timeout_ms),
    )
    .await?;
    Ok((BusClient::new(transport, cfg.auth.clone()), read))
}
