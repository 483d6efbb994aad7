/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Lock-guarded associative container for concurrent readers and writers.
//!
//! `SafeMap` wraps a `HashMap` behind a reader/writer lock by composition and
//! deliberately exposes no iterator-shaped API: a borrowed entry or iterator
//! could outlive the lock that protected it. Multi-step operations go through
//! [`SafeMap::transact_read`] / [`SafeMap::transact_mut`], which run a caller
//! closure while the lock is held so the whole step is atomic as a unit.

use crate::datamodel::ustatus::{UCode, UStatus};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const SAFE_MAP_TAG: &str = "SafeMap:";

/// Thread-safe key/value container.
///
/// Single-key operations each take the lock internally. Values are handed
/// out by clone so no reference escapes the guarded region.
#[derive(Debug, Default)]
pub struct SafeMap<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> SafeMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    // A poisoned lock means some transaction panicked midway; the map itself
    // is still structurally intact, so plain operations keep working on the
    // recovered guard.
    fn read_guard(&self) -> RwLockReadGuard<'_, HashMap<K, V>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, HashMap<K, V>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.read_guard().contains_key(key)
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.write_guard().insert(key, value)
    }

    pub fn clear(&self) {
        self.write_guard().clear();
    }

    /// Runs `f` with shared access to the wrapped container. Concurrent
    /// `transact_read` calls may overlap; any `transact_mut` is excluded for
    /// the duration.
    pub fn transact_read<R>(&self, f: impl FnOnce(&HashMap<K, V>) -> R) -> R {
        f(&self.read_guard())
    }

    /// Runs `f` with exclusive access to the wrapped container. The entire
    /// call is atomic with respect to every other operation on this map.
    pub fn transact_mut<R>(&self, f: impl FnOnce(&mut HashMap<K, V>) -> R) -> R {
        f(&mut self.write_guard())
    }

    /// Consumes the map and takes ownership of the wrapped container.
    ///
    /// Fails with `FailedPrecondition` if the lock was poisoned, i.e. a
    /// transaction panicked while it held exclusive access and the contents
    /// can no longer be vouched for as a consistent whole.
    pub fn into_inner(self) -> Result<HashMap<K, V>, UStatus> {
        self.inner.into_inner().map_err(|_| {
            UStatus::fail_with_code(
                UCode::FailedPrecondition,
                format!("{SAFE_MAP_TAG} cannot take ownership of a poisoned map"),
            )
        })
    }
}

impl<K, V> SafeMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn get(&self, key: &K) -> Option<V> {
        self.read_guard().get(key).cloned()
    }
}

impl<K, V> SafeMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Clones the map, holding the source's shared lock for the duration so
    /// the copy observes one consistent snapshot.
    ///
    /// Fails with `FailedPrecondition` if the source's lock is poisoned.
    pub fn try_clone(&self) -> Result<Self, UStatus> {
        let snapshot = self.inner.read().map_err(|_| {
            UStatus::fail_with_code(
                UCode::FailedPrecondition,
                format!("{SAFE_MAP_TAG} cannot clone from a poisoned map"),
            )
        })?;
        Ok(Self {
            inner: RwLock::new(snapshot.clone()),
        })
    }
}

impl<K, V> FromIterator<(K, V)> for SafeMap<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: RwLock::new(HashMap::from_iter(iter)),
        }
    }
}
