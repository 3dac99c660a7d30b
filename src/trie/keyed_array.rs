// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Dense keyed arrays: a trie hands out sequential slot numbers for byte
//! keys, and values live in a parallel `Vec` indexed by slot.
//!
//! Slots are assigned in insertion order starting from 0 and stay stable
//! for the life of the structure; they are never compacted or reused.
//! Lookups are O(key length) through the trie, value access by slot is a
//! plain array index.

use std::ops::{Deref, DerefMut};

use crate::trie::double_array::DoubleArrayTrie;

#[derive(Debug, Clone)]
pub struct TrieArray<V> {
    trie: DoubleArrayTrie,
    values: Vec<V>,
}

impl<V> Default for TrieArray<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TrieArray<V> {
    pub fn new() -> Self {
        Self {
            trie: DoubleArrayTrie::new(),
            values: Vec::new(),
        }
    }

    /// Returns the slot for `key` if it has been inserted before.
    pub fn find_key(&self, key: &[u8]) -> Option<usize> {
        let slot = self.trie.exact_match(key);
        if slot < 0 { None } else { Some(slot as usize) }
    }

    /// Inserts or overwrites the value for `key`, returning its slot.
    /// New keys receive the next sequential slot.
    pub fn insert_kv(&mut self, key: &[u8], value: V) -> usize {
        match self.find_key(key) {
            Some(slot) => {
                self.values[slot] = value;
                slot
            },
            None => {
                let slot = self.values.len();
                *self.trie.update(key) = slot as i32;
                self.values.push(value);
                slot
            },
        }
    }

    /// Value at `slot`. The slot must have been returned by a prior
    /// insertion; anything else is a programmer error.
    pub fn at(&self, slot: usize) -> &V {
        &self.values[slot]
    }

    pub fn at_mut(&mut self, slot: usize) -> &mut V {
        &mut self.values[slot]
    }

    /// Value for `key`, or `default` when the key is absent.
    pub fn at_key_or<'a>(&'a self, key: &[u8], default: &'a V) -> &'a V {
        match self.find_key(key) {
            Some(slot) => &self.values[slot],
            None => default,
        }
    }

    pub fn update_value(&mut self, slot: usize, value: V) {
        self.values[slot] = value;
    }

    /// Number of slots handed out so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates all entries as `(key_bytes, slot, value)`, in trie order
    /// (lexicographic, shorter keys first).
    pub fn iter(&self) -> impl Iterator<Item = (Vec<u8>, usize, &V)> + '_ {
        self.trie.iter().map(move |entry| {
            let mut key = vec![0u8; entry.key_len];
            self.trie.suffix(entry.leaf, entry.key_len, &mut key);
            let slot = entry.value as usize;
            (key, slot, &self.values[slot])
        })
    }

    /// The underlying trie, for prefix queries and direct inspection.
    pub fn trie(&self) -> &DoubleArrayTrie {
        &self.trie
    }
}

/// A [`TrieArray`] whose lookups may also match by longest common prefix.
#[derive(Debug, Clone)]
pub struct PrefixTrieArray<V> {
    inner: TrieArray<V>,
}

impl<V> Default for PrefixTrieArray<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PrefixTrieArray<V> {
    pub fn new() -> Self {
        Self {
            inner: TrieArray::new(),
        }
    }

    /// Returns `(value, prefix_len)` for the LONGEST stored key that is a
    /// prefix of `key`. Ties are impossible since keys are unique.
    pub fn prefix_match(&self, key: &[u8]) -> Option<(&V, usize)> {
        self.inner
            .trie
            .longest_prefix(key)
            .map(|(slot, len)| (&self.inner.values[slot as usize], len))
    }

    /// Longest-prefix value for `key`, or `default` when nothing matches.
    pub fn prefix_match_or<'a>(&'a self, key: &[u8], default: &'a V) -> &'a V {
        match self.prefix_match(key) {
            Some((value, _)) => value,
            None => default,
        }
    }
}

impl<V> Deref for PrefixTrieArray<V> {
    type Target = TrieArray<V>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<V> DerefMut for PrefixTrieArray<V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
