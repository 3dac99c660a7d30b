// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use rpcbus_client_rs::trie::{PrefixTrieArray, TrieArray};

#[test]
fn slots_follow_insertion_order() {
    let mut arr = TrieArray::new();
    assert_eq!(arr.insert_kv(b"one", 10u32), 0);
    assert_eq!(arr.insert_kv(b"two", 20), 1);
    assert_eq!(arr.insert_kv(b"three", 30), 2);
    assert_eq!(arr.len(), 3);

    assert_eq!(arr.find_key(b"one"), Some(0));
    assert_eq!(arr.find_key(b"two"), Some(1));
    assert_eq!(arr.find_key(b"three"), Some(2));
    assert_eq!(arr.find_key(b"four"), None);
    assert_eq!(*arr.at(1), 20);
}

#[test]
fn overwrite_keeps_slot_stable() {
    let mut arr = TrieArray::new();
    let slot = arr.insert_kv(b"key", 1u32);
    assert_eq!(arr.insert_kv(b"key", 2), slot);
    assert_eq!(arr.len(), 1);
    assert_eq!(*arr.at(slot), 2);

    arr.update_value(slot, 3);
    assert_eq!(*arr.at(slot), 3);
}

#[test]
fn at_key_or_falls_back() {
    let mut arr = TrieArray::new();
    arr.insert_kv(b"present", 5u32);
    assert_eq!(*arr.at_key_or(b"present", &0), 5);
    assert_eq!(*arr.at_key_or(b"absent", &0), 0);
}

#[test]
fn iteration_pairs_keys_with_their_slots() {
    let mut arr = TrieArray::new();
    let keys: &[&[u8]] = &[b"zebra", b"apple", b"mango", b"z"];
    for (i, key) in keys.iter().enumerate() {
        arr.insert_kv(key, i as u32);
    }

    let mut seen: Vec<(Vec<u8>, usize, u32)> =
        arr.iter().map(|(k, slot, v)| (k, slot, *v)).collect();
    assert_eq!(seen.len(), keys.len());
    seen.sort_by_key(|(_, slot, _)| *slot);
    for (i, (key, slot, value)) in seen.iter().enumerate() {
        assert_eq!(key.as_slice(), keys[i]);
        assert_eq!(*slot, i);
        assert_eq!(*value, i as u32);
    }
}

#[test]
fn prefix_match_prefers_the_longest_key() {
    let mut arr = PrefixTrieArray::new();
    arr.insert_kv(b"/", "root");
    arr.insert_kv(b"/api", "api");
    arr.insert_kv(b"/api/v2", "v2");

    assert_eq!(arr.prefix_match(b"/api/v2/users"), Some((&"v2", 7)));
    assert_eq!(arr.prefix_match(b"/api/v1"), Some((&"api", 4)));
    assert_eq!(arr.prefix_match(b"/other"), Some((&"root", 1)));
    assert!(arr.prefix_match(b"no-slash").is_none());
}

#[test]
fn prefix_match_or_uses_the_default() {
    let mut arr = PrefixTrieArray::new();
    arr.insert_kv(b"abc", 1u32);
    assert_eq!(*arr.prefix_match_or(b"abcdef", &0), 1);
    assert_eq!(*arr.prefix_match_or(b"xyz", &0), 0);
}

#[test]
fn prefix_array_still_answers_exact_queries() {
    let mut arr = PrefixTrieArray::new();
    arr.insert_kv(b"abc", 1u32);
    arr.insert_kv(b"abcdef", 2);
    assert_eq!(arr.find_key(b"abc"), Some(0));
    assert_eq!(arr.find_key(b"abcdef"), Some(1));
    assert_eq!(arr.find_key(b"abcd"), None);
}
