// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The protocol state machine driving a message-bus connection.
//!
//! `BusClient` consumes one server frame at a time, routes it by
//! directive prefix, and reacts: it answers auth challenges, tracks the
//! ready flag, (re)advertises its RPC providers, and dispatches inbound
//! RPC invocations to registered handlers. The externally observable
//! state is just `(transport live, ready)`; everything else is implicit
//! in `login_retries` and the frames on the wire.
//!
//! Handlers run to completion on the thread that drives the client; the
//! handler type is deliberately not `Send`.

use std::{
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use anyhow::{Context, Result, bail};
use tracing::{debug, error, trace, warn};

use crate::{
    client::{creds::CredentialsSupplier, transport::Transport},
    pool::PooledBuf,
    protocol::{
        self, SENDBUF_SIZE,
        directive::{DirectiveKind, router},
    },
    rpc::{RpcCall, RpcRegistry},
};

/// A user-supplied RPC handler. The handler owns `call` (and with it the
/// request buffer) until it either consumes it via
/// [`BusClient::send_rpc_result`] or drops it; an `Err` return signals a
/// local failure and no response is sent automatically.
pub type RpcHandler<IO, CS> = Rc<dyn Fn(&mut BusClient<IO, CS>, RpcCall) -> Result<()>>;

pub struct BusClient<IO: Transport, CS: CredentialsSupplier> {
    io: IO,
    creds: CS,
    providers: RpcRegistry<RpcHandler<IO, CS>>,
    ready: bool,
    login_retries: u32,
}

impl<IO: Transport, CS: CredentialsSupplier> BusClient<IO, CS> {
    pub fn new(io: IO, creds: CS) -> Self {
        Self {
            io,
            creds,
            providers: RpcRegistry::new(),
            ready: false,
            login_retries: 0,
        }
    }

    /// True between a successful authentication and the next disconnect
    /// or transport close.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn login_retries(&self) -> u32 {
        self.login_retries
    }

    pub fn transport(&self) -> &IO {
        &self.io
    }

    pub fn transport_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// Entry point for every inbound frame: one `0x1E`-terminated
    /// message per call, terminator included, ownership transferred.
    /// Errors mean the frame was discarded (unknown directive, malformed
    /// request, failed write); the connection stays usable.
    pub fn handle_server_directive(&mut self, frame: PooledBuf) -> Result<()> {
        let kind = router().dispatch(&frame);
        trace!(?kind, len = frame.len(), "server directive");
        match kind {
            DirectiveKind::ServerNeedsAuth => self.on_server_needs_auth(frame),
            DirectiveKind::LoginSuccessful => self.on_login_successful(frame),
            DirectiveKind::LoginInvalid => self.on_login_invalid(frame),
            DirectiveKind::TooManyAuthAttempts => self.on_too_many_auth_attempts(frame),
            DirectiveKind::ProviderAcknowledged => self.on_provider_acknowledged(frame),
            DirectiveKind::RpcRequest => self.on_rpc_call_received(frame),
            DirectiveKind::Unknown => self.on_unknown(frame),
        }
    }

    /// Marks the transport dead. Invoked by the read driver on EOF or a
    /// read error; in-flight handler work may still finish, but its
    /// responses go nowhere.
    pub fn on_transport_closed(&mut self) {
        self.ready = false;
    }

    /// Drops readiness and closes the transport. Idempotent.
    pub fn disconnect(&mut self) -> Result<()> {
        self.ready = false;
        self.io.disconnect()
    }

    //////////////////////////////////////////////////////////
    // Directive handlers
    //

    fn on_server_needs_auth(&mut self, _frame: PooledBuf) -> Result<()> {
        debug!("server requested authentication");
        self.send_auth()
    }

    fn on_login_successful(&mut self, _frame: PooledBuf) -> Result<()> {
        self.login_retries = 0;
        self.ready = true;
        debug!("login successful, advertising providers");
        self.advertise_all()
    }

    fn on_login_invalid(&mut self, _frame: PooledBuf) -> Result<()> {
        self.ready = false;
        if self.login_retries < self.creds.max_retries() {
            self.login_retries += 1;
            warn!(retries = self.login_retries, "credentials rejected, retrying");
            self.send_auth()
        } else {
            warn!("credentials rejected with no retries left, disconnecting");
            self.disconnect()
        }
    }

    fn on_too_many_auth_attempts(&mut self, _frame: PooledBuf) -> Result<()> {
        warn!("server refused further auth attempts, disconnecting");
        self.disconnect()
    }

    fn on_provider_acknowledged(&mut self, _frame: PooledBuf) -> Result<()> {
        trace!("provider advertisement acknowledged");
        Ok(())
    }

    fn on_unknown(&mut self, frame: PooledBuf) -> Result<()> {
        error!(
            frame = %String::from_utf8_lossy(&frame).escape_default(),
            "unknown server directive"
        );
        bail!("unknown server directive");
    }

    //////////////////////////////////////////////////////////
    // RPC
    //

    /// Registers `handler` for `method`. While ready, the provider is
    /// advertised immediately; otherwise advertisement happens on the
    /// next transition to ready.
    pub fn register_rpc_provider(
        &mut self,
        method: &str,
        handler: RpcHandler<IO, CS>,
        cacheable: bool,
    ) -> Result<()> {
        self.providers
            .register(method.as_bytes(), handler, cacheable)?;
        debug!(method, "rpc provider registered");
        if self.ready {
            self.send_provide(method.as_bytes())
        } else {
            Ok(())
        }
    }

    /// Withdraws the provider for `method`. Unknown methods are a no-op.
    pub fn unregister_rpc_provider(&mut self, method: &str) -> Result<()> {
        let was_live = self.providers.unregister(method.as_bytes());
        if was_live {
            debug!(method, "rpc provider unregistered");
        }
        if was_live && self.ready {
            self.send_unprovide(method.as_bytes())
        } else {
            Ok(())
        }
    }

    pub fn providers(&self) -> &RpcRegistry<RpcHandler<IO, CS>> {
        &self.providers
    }

    fn on_rpc_call_received(&mut self, frame: PooledBuf) -> Result<()> {
        let call = match RpcCall::parse(frame) {
            Ok(call) => call,
            Err(e) => {
                error!(error = %e, "malformed rpc request frame, discarding");
                bail!(e);
            },
        };

        let handler = match self.providers.lookup(call.method()) {
            Some(provider) => Rc::clone(&provider.handler),
            None => {
                debug!(
                    method = %String::from_utf8_lossy(call.method()),
                    "rpc method not provided, rejecting"
                );
                let reject = call.into_reject_frame();
                return self.io.send(reject);
            },
        };

        // the acknowledgement always precedes the handler's response
        self.send_rpc_ack(call.method(), call.uid())?;

        match panic::catch_unwind(AssertUnwindSafe(|| handler(self, call))) {
            Ok(result) => result,
            Err(_) => {
                error!("rpc handler panicked; request buffer was released by unwind");
                bail!("rpc handler panicked");
            },
        }
    }

    /// Consumes `call`, rewriting its request buffer in place into a
    /// string-result response, and hands the frame to the transport.
    pub fn send_rpc_result(&mut self, call: RpcCall, result: &[u8]) -> Result<()> {
        let frame = call.into_result_frame(result)?;
        self.io.send(frame)
    }

    //////////////////////////////////////////////////////////
    // Outbound frames
    //

    fn send_auth(&mut self) -> Result<()> {
        let mut buf = self.alloc(SENDBUF_SIZE)?;
        protocol::encode_auth_request(&mut buf, self.creds.username(), self.creds.password())?;
        self.io.send(buf)
    }

    fn send_provide(&mut self, method: &[u8]) -> Result<()> {
        let mut buf = self.alloc(SENDBUF_SIZE)?;
        protocol::encode_provide(&mut buf, method)?;
        self.io.send(buf)
    }

    fn send_unprovide(&mut self, method: &[u8]) -> Result<()> {
        let mut buf = self.alloc(SENDBUF_SIZE)?;
        protocol::encode_unprovide(&mut buf, method)?;
        self.io.send(buf)
    }

    fn send_rpc_ack(&mut self, method: &[u8], uid: &[u8]) -> Result<()> {
        let mut buf = self.alloc(SENDBUF_SIZE)?;
        protocol::encode_rpc_ack(&mut buf, method, uid)?;
        self.io.send(buf)
    }

    /// One advertisement per live provider, in registration order.
    fn advertise_all(&mut self) -> Result<()> {
        for method in self.providers.live_names() {
            self.send_provide(&method)?;
        }
        Ok(())
    }

    fn alloc(&mut self, size: usize) -> Result<PooledBuf> {
        self.io
            .alloc_send_buffer(size)
            .context("send buffer pool exhausted")
    }
}
