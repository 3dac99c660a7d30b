// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Pooled buffer allocation.
//!
//! Two allocators share the freelist idea: [`sized`] hands out opaque
//! byte blocks rounded to power-of-two size classes, [`typed`] recycles
//! storage for a single fixed-layout type. Both give back move-only
//! handles that return their block to the pool on drop, so every block is
//! released exactly once no matter which code path consumes it.

pub mod sized;
pub mod typed;

pub use sized::{PoolStats, PooledBuf, acquire, stats};
pub use typed::{PooledBox, TypedPool};
