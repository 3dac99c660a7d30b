// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Parsed view of an inbound RPC request frame.
//!
//! An `RpcCall` owns the frame buffer it was parsed from and records the
//! method, uid and params fields as offset ranges into that buffer, so
//! the descriptor never copies payload bytes and cannot dangle. The
//! response encoders rewrite the same buffer in place: an inbound
//! `P|REQ|…` frame is already pool memory of adequate size, so the
//! common string-result path costs no allocation and no copy.

use std::ops::Range;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::{
    pool::{self, PooledBuf},
    protocol::{MAX_METHODNAME_LEN, MAX_UID_LEN, MESSAGE_SEPARATOR, PART_SEPARATOR},
};

/// Why an inbound `P|REQ|` frame could not be parsed. Malformed frames
/// are discarded without a response.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("rpc request frame truncated in the {0} field")]
    Truncated(&'static str),
    #[error("rpc method name exceeds {MAX_METHODNAME_LEN} bytes")]
    MethodTooLong,
    #[error("rpc uid exceeds {MAX_UID_LEN} bytes")]
    UidTooLong,
}

#[derive(Debug)]
pub struct RpcCall {
    buf: PooledBuf,
    method: Range<usize>,
    uid: Range<usize>,
    params: Range<usize>,
}

impl RpcCall {
    /// Length of the `P|REQ|` prefix every call frame starts with.
    pub const PREFIX_LEN: usize = 6;
    /// Offset of the byte that distinguishes REQ / RES / REJ.
    const KIND_OFFSET: usize = 4;

    /// Parses `P|REQ|METHOD|UID|PARAMS+`. Consumes the frame buffer; on
    /// a malformed frame the buffer is dropped (released) here and the
    /// error describes the offending field.
    pub fn parse(buf: PooledBuf) -> Result<Self, FrameError> {
        let bytes: &[u8] = &buf;
        if bytes.len() < Self::PREFIX_LEN {
            return Err(FrameError::Truncated("prefix"));
        }

        let method_start = Self::PREFIX_LEN;
        let method_len = field_len(&bytes[method_start..], "method")?;
        if method_len >= MAX_METHODNAME_LEN {
            return Err(FrameError::MethodTooLong);
        }
        let method = method_start..method_start + method_len;

        let uid_start = method.end + 1;
        let uid_len = field_len(&bytes[uid_start..], "uid")?;
        if uid_len >= MAX_UID_LEN {
            return Err(FrameError::UidTooLong);
        }
        let uid = uid_start..uid_start + uid_len;

        let params_start = uid.end + 1;
        let params_end = if bytes.last() == Some(&MESSAGE_SEPARATOR) {
            bytes.len() - 1
        } else {
            bytes.len()
        };
        let params = params_start..params_end.max(params_start);

        Ok(Self {
            buf,
            method,
            uid,
            params,
        })
    }

    pub fn method(&self) -> &[u8] {
        &self.buf[self.method.clone()]
    }

    pub fn uid(&self) -> &[u8] {
        &self.buf[self.uid.clone()]
    }

    /// The raw params bytes, opaque to the core (usually JSON).
    pub fn params(&self) -> &[u8] {
        &self.buf[self.params.clone()]
    }

    /// Rewrites the request frame in place into a string-result response
    /// `P|RES|METHOD|UID|S<result>+` and returns the buffer ready to
    /// send. Falls back to a fresh pool buffer only when the result does
    /// not fit the original block.
    pub fn into_result_frame(self, result: &[u8]) -> Result<PooledBuf> {
        let Self {
            mut buf, params, ..
        } = self;
        let need = params.start + 1 + result.len() + 1;
        if need > buf.capacity() {
            let mut bigger = pool::acquire(need).context("buffer pool exhausted")?;
            bigger.block_mut()[..params.start]
                .copy_from_slice(&buf.block()[..params.start]);
            // the undersized request frame goes back to the pool
            buf.reset(bigger);
        }
        let block = buf.block_mut();
        block[Self::KIND_OFFSET] = b'S';
        block[params.start] = b'S';
        block[params.start + 1..params.start + 1 + result.len()].copy_from_slice(result);
        block[params.start + 1 + result.len()] = MESSAGE_SEPARATOR;
        buf.set_len(need);
        Ok(buf)
    }

    /// Rewrites the request frame in place into `P|REJ|METHOD|UID+` and
    /// returns the buffer ready to send. Params are dropped.
    pub fn into_reject_frame(self) -> PooledBuf {
        let Self { mut buf, uid, .. } = self;
        let block = buf.block_mut();
        block[Self::KIND_OFFSET] = b'J';
        block[uid.end] = MESSAGE_SEPARATOR;
        buf.set_len(uid.end + 1);
        buf
    }
}

/// Bytes up to the next part separator, or an error naming `field`.
fn field_len(bytes: &[u8], field: &'static str) -> Result<usize, FrameError> {
    bytes
        .iter()
        .position(|&b| b == PART_SEPARATOR)
        .ok_or(FrameError::Truncated(field))
}
