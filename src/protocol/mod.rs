// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Wire-level constants and outbound frame composition.
//!
//! A frame is a byte sequence terminated by the message separator
//! `0x1E`; fields inside a frame are split by the part separator `0x1F`.
//! There is no length prefix and no escaping: payload producers must not
//! emit the separator bytes inside field content.

use anyhow::{Result, ensure};
use serde::Serialize;

use crate::pool::PooledBuf;

/// Directive table and longest-prefix dispatch.
pub mod directive;

/// Terminates every frame ("message separator").
pub const MESSAGE_SEPARATOR: u8 = 0x1E;
/// Splits fields inside a frame ("part separator").
pub const PART_SEPARATOR: u8 = 0x1F;

/// Default size requested for outbound frame buffers.
pub const SENDBUF_SIZE: usize = 4096;
/// RPC call uids longer than this are treated as malformed.
pub const MAX_UID_LEN: usize = 64;
/// Method names must be shorter than this, both on register and on parse.
pub const MAX_METHODNAME_LEN: usize = 128;
pub const MAX_USERNAME_LEN: usize = 32;
pub const MAX_PASSWORD_LEN: usize = 32;
/// Upper bound on a registered directive prefix; longer is a programmer
/// error.
pub const MAX_DIRECTIVE_LEN: usize = 32;
/// Capacity of the directive handler table.
pub const MAX_HANDLERS_COUNT: usize = 16;

/// Converts the human notation used in directive tables to wire bytes:
/// `|` becomes the part separator, `+` the message separator.
pub fn directive_bytes(human: &str) -> Vec<u8> {
    human
        .bytes()
        .map(|ch| match ch {
            b'|' => PART_SEPARATOR,
            b'+' => MESSAGE_SEPARATOR,
            other => other,
        })
        .collect()
}

#[derive(Serialize)]
struct AuthPayload<'a> {
    username: &'a str,
    password: &'a str,
}

/// Writes `A|REQ|{"username":…,"password":…}+` into `buf`.
pub fn encode_auth_request(buf: &mut PooledBuf, username: &str, password: &str) -> Result<()> {
    debug_assert!(username.len() < MAX_USERNAME_LEN, "oversize username");
    debug_assert!(password.len() < MAX_PASSWORD_LEN, "oversize password");
    let payload = serde_json::to_vec(&AuthPayload { username, password })?;
    encode_parts(buf, &[b"A", b"REQ", &payload])
}

/// Writes a provider advertisement `P|S|name+` into `buf`.
pub fn encode_provide(buf: &mut PooledBuf, name: &[u8]) -> Result<()> {
    encode_parts(buf, &[b"P", b"S", name])
}

/// Writes a provider withdrawal `P|US|name+` into `buf`.
pub fn encode_unprovide(buf: &mut PooledBuf, name: &[u8]) -> Result<()> {
    encode_parts(buf, &[b"P", b"US", name])
}

/// Writes the call acknowledgement `P|A|method|uid+` into `buf`.
pub fn encode_rpc_ack(buf: &mut PooledBuf, method: &[u8], uid: &[u8]) -> Result<()> {
    encode_parts(buf, &[b"P", b"A", method, uid])
}

/// Joins `parts` with part separators and appends the message separator.
fn encode_parts(buf: &mut PooledBuf, parts: &[&[u8]]) -> Result<()> {
    let need = parts.iter().map(|p| p.len()).sum::<usize>() + parts.len();
    ensure!(
        need <= buf.capacity(),
        "frame of {need} bytes does not fit a {} byte send buffer",
        buf.capacity()
    );
    let block = buf.block_mut();
    let mut at = 0usize;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            block[at] = PART_SEPARATOR;
            at += 1;
        }
        block[at..at + part.len()].copy_from_slice(part);
        at += part.len();
    }
    block[at] = MESSAGE_SEPARATOR;
    at += 1;
    buf.set_len(at);
    Ok(())
}
