// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The boundary between the protocol core and the network layer.

use anyhow::Result;

use crate::pool::PooledBuf;

/// What the state machine needs from a network implementation.
///
/// `send` is fire-and-forget: it takes ownership of the frame buffer and
/// the implementation releases it once the write has completed, whether
/// the write succeeded or not. That keeps the owning-buffer discipline a
/// single rule: whoever holds the handle last releases it, exactly once.
pub trait Transport {
    /// A writable pooled region the core will fill with one frame.
    /// `None` means the pool is exhausted; the operation fails but the
    /// client survives.
    fn alloc_send_buffer(&mut self, size: usize) -> Option<PooledBuf>;

    /// Enqueues `buf` for writing, consuming it. Must not block.
    fn send(&mut self, buf: PooledBuf) -> Result<()>;

    /// Stops reads and closes the channel. Idempotent.
    fn disconnect(&mut self) -> Result<()>;
}
