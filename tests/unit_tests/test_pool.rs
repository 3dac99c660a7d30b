// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{cell::Cell, rc::Rc};

use rpcbus_client_rs::pool::{self, TypedPool};
use serial_test::serial;

#[test]
#[serial]
fn sizes_round_up_to_power_of_two_classes() {
    let small = pool::acquire(1).expect("pool exhausted");
    assert_eq!(small.capacity(), 1024);
    let kilo = pool::acquire(1024).expect("pool exhausted");
    assert_eq!(kilo.capacity(), 1024);
    let above = pool::acquire(1025).expect("pool exhausted");
    assert_eq!(above.capacity(), 2048);
    let exact = pool::acquire(4096).expect("pool exhausted");
    assert_eq!(exact.capacity(), 4096);
}

#[test]
#[serial]
fn reused_blocks_come_back_zeroed() {
    // a class no other test touches, so the freelist hit is ours
    let class = 1 << 20;
    {
        let mut buf = pool::acquire(class).expect("pool exhausted");
        buf.block_mut().fill(0xAB);
    }
    let buf = pool::acquire(class).expect("pool exhausted");
    assert!(buf.block().iter().all(|&b| b == 0));
    assert_eq!(buf.len(), 0);
}

#[test]
#[serial]
fn drop_returns_the_block_to_the_pool() {
    let before = pool::stats();
    {
        let _a = pool::acquire(100).expect("pool exhausted");
        let _b = pool::acquire(100).expect("pool exhausted");
        let mid = pool::stats();
        assert_eq!(mid.acquired - before.acquired, 2);
        assert_eq!(mid.outstanding() - before.outstanding(), 2);
    }
    let after = pool::stats();
    assert_eq!(after.released - before.released, 2);
    assert_eq!(after.outstanding(), before.outstanding());
}

#[test]
#[serial]
fn handle_tracks_logical_length() {
    let mut buf = pool::acquire(64).expect("pool exhausted");
    assert!(buf.is_empty());
    buf.fill_from(b"hello");
    assert_eq!(buf.len(), 5);
    assert_eq!(&buf[..], b"hello");

    buf.set_len(4);
    assert_eq!(&buf[..], b"hell");

    buf[0] = b'y';
    assert_eq!(&buf[..], b"yell");
}

#[test]
#[serial]
fn reset_releases_the_old_block() {
    let before = pool::stats();
    let mut buf = pool::acquire(64).expect("pool exhausted");
    let replacement = pool::acquire(64).expect("pool exhausted");
    buf.reset(replacement);
    let mid = pool::stats();
    assert_eq!(mid.released - before.released, 1);
    drop(buf);
    let after = pool::stats();
    assert_eq!(after.released - before.released, 2);
    assert_eq!(after.outstanding(), before.outstanding());
}

#[test]
#[serial]
fn moving_the_handle_moves_the_release_duty() {
    let before = pool::stats();
    let buf = pool::acquire(64).expect("pool exhausted");
    let moved = buf;
    assert_eq!(pool::stats().released, before.released);
    drop(moved);
    assert_eq!(pool::stats().released - before.released, 1);
}

struct Tracked {
    drops: Rc<Cell<u32>>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

#[test]
fn typed_pool_constructs_and_destroys_in_place() {
    let pool: TypedPool<Tracked> = TypedPool::new();
    let drops = Rc::new(Cell::new(0));

    let handle = pool.acquire(Tracked {
        drops: Rc::clone(&drops),
    });
    assert_eq!(drops.get(), 0);
    drop(handle);
    assert_eq!(drops.get(), 1);
    assert_eq!(pool.free_count(), 1);

    // the freelist block is reused and destroyed again
    let handle = pool.acquire(Tracked {
        drops: Rc::clone(&drops),
    });
    assert_eq!(pool.free_count(), 0);
    drop(handle);
    assert_eq!(drops.get(), 2);
    assert_eq!(pool.free_count(), 1);
}

#[test]
fn typed_pool_into_inner_skips_the_destructor() {
    let pool: TypedPool<Tracked> = TypedPool::new();
    let drops = Rc::new(Cell::new(0));

    let handle = pool.acquire(Tracked {
        drops: Rc::clone(&drops),
    });
    let value = handle.into_inner();
    assert_eq!(drops.get(), 0);
    assert_eq!(pool.free_count(), 1);
    drop(value);
    assert_eq!(drops.get(), 1);
}

#[test]
fn typed_pool_handles_are_plain_references_to_the_value() {
    let pool: TypedPool<Vec<u8>> = TypedPool::new();
    let mut handle = pool.acquire(vec![1, 2, 3]);
    handle.push(4);
    assert_eq!(&*handle, &[1, 2, 3, 4]);
}
