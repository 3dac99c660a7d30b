// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Byte-keyed trie structures used for directive routing and the RPC
//! provider registry.

/// Double-array trie over raw byte keys.
pub mod double_array;
/// Dense keyed arrays layered on top of the trie.
pub mod keyed_array;

pub use double_array::{DoubleArrayTrie, NO_PATH, NO_VALUE};
pub use keyed_array::{PrefixTrieArray, TrieArray};
