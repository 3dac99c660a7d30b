// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Maps inbound frames to handler selectors by directive prefix.
//!
//! The router is initialised once from a static table and is immutable
//! afterwards, so it can be shared process-wide without synchronisation.
//! Dispatch runs a longest-common-prefix search over the registered
//! directive keys; a frame no registered key prefixes yields
//! [`DirectiveKind::Unknown`].

use once_cell::sync::Lazy;

use crate::{
    protocol::{MAX_DIRECTIVE_LEN, MAX_HANDLERS_COUNT, directive_bytes},
    trie::PrefixTrieArray,
};

/// Selector for the client method that handles a directive. The set is
/// closed at compile time; dispatch is a plain `match` on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `C|A+`: connection acknowledged, server wants credentials.
    ServerNeedsAuth,
    /// `A|A`: authentication accepted.
    LoginSuccessful,
    /// `A|E|INVALID_AUTH_DATA|`: credentials rejected.
    LoginInvalid,
    /// `A|E|TOO_MANY_AUTH_ATTEMPTS|`: server gave up on us.
    TooManyAuthAttempts,
    /// `P|A|S|`: provider advertisement acknowledged.
    ProviderAcknowledged,
    /// `P|REQ|`: inbound RPC invocation.
    RpcRequest,
    /// No registered prefix matched.
    Unknown,
}

static ROUTER: Lazy<DirectiveRouter> = Lazy::new(DirectiveRouter::with_default_table);

/// The process-wide router over the standard directive set.
pub fn router() -> &'static DirectiveRouter {
    &ROUTER
}

#[derive(Debug)]
pub struct DirectiveRouter {
    table: PrefixTrieArray<DirectiveKind>,
}

impl DirectiveRouter {
    fn with_default_table() -> Self {
        Self::from_table(&[
            ("C|A+", DirectiveKind::ServerNeedsAuth),
            ("A|A", DirectiveKind::LoginSuccessful),
            ("A|E|INVALID_AUTH_DATA|", DirectiveKind::LoginInvalid),
            ("A|E|TOO_MANY_AUTH_ATTEMPTS|", DirectiveKind::TooManyAuthAttempts),
            ("P|A|S|", DirectiveKind::ProviderAcknowledged),
            ("P|REQ|", DirectiveKind::RpcRequest),
        ])
    }

    /// Builds a router from `(human notation, selector)` pairs. Oversize
    /// prefixes and oversize tables are programmer errors.
    pub fn from_table(table: &[(&str, DirectiveKind)]) -> Self {
        assert!(
            table.len() <= MAX_HANDLERS_COUNT,
            "directive table exceeds {MAX_HANDLERS_COUNT} handlers"
        );
        let mut prefixes = PrefixTrieArray::new();
        for (human, kind) in table {
            let key = directive_bytes(human);
            assert!(
                key.len() < MAX_DIRECTIVE_LEN,
                "directive prefix too long: {human}"
            );
            prefixes.insert_kv(&key, *kind);
        }
        Self { table: prefixes }
    }

    /// Selects the handler for `frame` by its longest registered prefix.
    pub fn dispatch(&self, frame: &[u8]) -> DirectiveKind {
        *self
            .table
            .prefix_match_or(frame, &DirectiveKind::Unknown)
    }
}
