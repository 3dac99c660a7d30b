// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Freelist pool for a single fixed-layout type.
//!
//! [`TypedPool::acquire`] constructs the value in recycled storage and
//! returns a [`PooledBox`]; dropping the box destroys the value and puts
//! the storage back on the freelist. `TypedPool::new` is `const`, so a
//! pool can live in a `static`.

use std::{
    fmt,
    mem::MaybeUninit,
    ops::{Deref, DerefMut},
    sync::Mutex,
};

pub struct TypedPool<T> {
    free: Mutex<Vec<Box<MaybeUninit<T>>>>,
}

impl<T> TypedPool<T> {
    pub const fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Constructs `value` in pooled storage.
    pub fn acquire(&self, value: T) -> PooledBox<'_, T> {
        let mut storage = self
            .free
            .lock()
            .expect("typed pool mutex poisoned")
            .pop()
            .unwrap_or_else(|| Box::new(MaybeUninit::uninit()));
        storage.write(value);
        PooledBox {
            pool: self,
            storage: Some(storage),
        }
    }

    /// Blocks currently sitting on the freelist.
    pub fn free_count(&self) -> usize {
        self.free.lock().expect("typed pool mutex poisoned").len()
    }

    fn recycle(&self, storage: Box<MaybeUninit<T>>) {
        self.free
            .lock()
            .expect("typed pool mutex poisoned")
            .push(storage);
    }
}

impl<T> Default for TypedPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedPool")
            .field("free", &self.free_count())
            .finish()
    }
}

/// Owning handle to a pooled `T`. Move-only; drop destroys the value and
/// recycles its storage.
pub struct PooledBox<'p, T> {
    pool: &'p TypedPool<T>,
    // invariant: Some and initialized until drop or into_inner
    storage: Option<Box<MaybeUninit<T>>>,
}

impl<T> PooledBox<'_, T> {
    /// Moves the value out, returning the storage to the pool.
    pub fn into_inner(mut self) -> T {
        let storage = self
            .storage
            .take()
            .expect("pooled box already consumed");
        // SAFETY: storage was initialized by `acquire` and not yet dropped
        let value = unsafe { storage.assume_init_read() };
        self.pool.recycle(storage);
        value
    }
}

impl<T> Deref for PooledBox<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        let storage = self.storage.as_ref().expect("pooled box already consumed");
        // SAFETY: storage was initialized by `acquire` and not yet dropped
        unsafe { storage.assume_init_ref() }
    }
}

impl<T> DerefMut for PooledBox<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        let storage = self.storage.as_mut().expect("pooled box already consumed");
        // SAFETY: storage was initialized by `acquire` and not yet dropped
        unsafe { storage.assume_init_mut() }
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledBox<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T> Drop for PooledBox<'_, T> {
    fn drop(&mut self) {
        if let Some(mut storage) = self.storage.take() {
            // SAFETY: storage was initialized by `acquire` and this is the
            // single destruction point
            unsafe { storage.assume_init_drop() };
            self.pool.recycle(storage);
        }
    }
}
