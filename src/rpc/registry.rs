// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-client registry of RPC providers.
//!
//! Method names index into a [`TrieArray`]; the slot holds
//! `Some(provider)` while the method is live and `None` after
//! unregistration. The trie key and the slot survive unregistration, so
//! re-registering the same name reuses its original slot and slot
//! numbers stay stable for the life of the registry.

use thiserror::Error;

use crate::{protocol::MAX_METHODNAME_LEN, trie::TrieArray};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("method name must be shorter than {MAX_METHODNAME_LEN} bytes")]
    NameTooLong,
    #[error("method is already registered with a live handler")]
    AlreadyRegistered,
}

/// A registered provider: the user callable plus the hint that its
/// results are safe to cache server-side.
#[derive(Debug, Clone)]
pub struct Provider<H> {
    pub handler: H,
    pub cacheable: bool,
}

#[derive(Debug, Clone)]
pub struct RpcRegistry<H> {
    providers: TrieArray<Option<Provider<H>>>,
}

impl<H> Default for RpcRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RpcRegistry<H> {
    pub fn new() -> Self {
        Self {
            providers: TrieArray::new(),
        }
    }

    /// Registers `handler` for `name`, returning the assigned slot.
    /// Fails when the name is too long or currently live; a tombstoned
    /// name is overwritten in place.
    pub fn register(
        &mut self,
        name: &[u8],
        handler: H,
        cacheable: bool,
    ) -> Result<usize, RegistryError> {
        if name.len() >= MAX_METHODNAME_LEN {
            return Err(RegistryError::NameTooLong);
        }
        if let Some(slot) = self.providers.find_key(name) {
            if self.providers.at(slot).is_some() {
                return Err(RegistryError::AlreadyRegistered);
            }
        }
        Ok(self
            .providers
            .insert_kv(name, Some(Provider { handler, cacheable })))
    }

    /// Tombstones a live entry, returning true. Unknown or already
    /// tombstoned names are a successful no-op (false).
    pub fn unregister(&mut self, name: &[u8]) -> bool {
        match self.providers.find_key(name) {
            Some(slot) if self.providers.at(slot).is_some() => {
                self.providers.update_value(slot, None);
                true
            },
            _ => false,
        }
    }

    /// The live provider for `name`, if any. Tombstones read as absent.
    pub fn lookup(&self, name: &[u8]) -> Option<&Provider<H>> {
        let slot = self.providers.find_key(name)?;
        self.providers.at(slot).as_ref()
    }

    pub fn slot_of(&self, name: &[u8]) -> Option<usize> {
        self.providers.find_key(name)
    }

    /// Names of all live providers in slot order. Slots are assigned at
    /// first registration, so advertisements replay in the order methods
    /// were first registered.
    pub fn live_names(&self) -> Vec<Vec<u8>> {
        let mut live: Vec<(usize, Vec<u8>)> = self
            .providers
            .iter()
            .filter(|(_, _, value)| value.is_some())
            .map(|(name, slot, _)| (slot, name))
            .collect();
        live.sort_unstable_by_key(|(slot, _)| *slot);
        live.into_iter().map(|(_, name)| name).collect()
    }

    /// Slots handed out so far, tombstones included.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
