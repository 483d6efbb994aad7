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

//! Strong/weak connection pair between a registered callback and the code
//! that invokes it.
//!
//! [`establish`] hands the registering caller a move-only
//! [`ConnectionHandle`] (the strong side) and the invoking party any number
//! of [`Callable`] clones (the weak side). Releasing or dropping the handle
//! severs the connection: the validity flag reads false immediately, the
//! callback can never fire again once `release` returns, and the cleanup
//! closure runs exactly once.

use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

type Callback<T> = Box<dyn Fn(T) + Send + Sync>;
/// Closure run exactly once when a connection is severed.
pub type Cleanup<T> = Box<dyn FnOnce(Callable<T>) + Send>;

struct ConnectionCore<T> {
    connected: AtomicBool,
    callback: RwLock<Option<Callback<T>>>,
}

/// Establishes a connection between `callback` and its future invokers.
///
/// `cleanup` (if any) is handed a [`Callable`] identifying the severed
/// connection; it fires on the thread that releases the handle, after the
/// weak side already reads disconnected, so it may safely take locks of its
/// own.
pub fn establish<T, F>(callback: F, cleanup: Option<Cleanup<T>>) -> (ConnectionHandle<T>, Callable<T>)
where
    F: Fn(T) + Send + Sync + 'static,
{
    let core = Arc::new(ConnectionCore {
        connected: AtomicBool::new(true),
        callback: RwLock::new(Some(Box::new(callback) as Callback<T>)),
    });
    let callable = Callable {
        core: Arc::downgrade(&core),
    };
    (ConnectionHandle { core, cleanup }, callable)
}

/// Strong side of a connection. Move-only; at most one exists per
/// connection.
pub struct ConnectionHandle<T> {
    core: Arc<ConnectionCore<T>>,
    cleanup: Option<Cleanup<T>>,
}

impl<T> ConnectionHandle<T> {
    pub fn is_connected(&self) -> bool {
        self.core.connected.load(Ordering::SeqCst)
    }

    /// Severs the connection. Idempotent.
    ///
    /// When this returns, no invocation through any [`Callable`] clone is in
    /// flight or can start, and the cleanup closure (first call only) has
    /// completed.
    pub fn release(&mut self) {
        let was_connected = self.core.connected.swap(false, Ordering::SeqCst);
        // Taking the write lock waits out any invocation currently holding
        // the read lock; clearing the slot makes later invocations no-ops.
        self.core
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if was_connected {
            if let Some(cleanup) = self.cleanup.take() {
                cleanup(Callable {
                    core: Arc::downgrade(&self.core),
                });
            }
        }
    }

    /// Severs the connection without running cleanup. Used when registration
    /// with the invoking party failed and it therefore holds nothing to
    /// clean up.
    pub(crate) fn abandon(mut self) {
        self.cleanup = None;
    }
}

impl<T> Drop for ConnectionHandle<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> Debug for ConnectionHandle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Weak side of a connection: invokes the callback while the strong side is
/// alive, and degrades to a guaranteed no-op afterwards.
pub struct Callable<T> {
    core: Weak<ConnectionCore<T>>,
}

impl<T> Callable<T> {
    pub fn is_connected(&self) -> bool {
        self.core
            .upgrade()
            .is_some_and(|core| core.connected.load(Ordering::SeqCst))
    }

    /// Invokes the callback with `value` if the connection is still live.
    ///
    /// The validity check and the call happen under the connection's read
    /// lock, so a concurrent [`ConnectionHandle::release`] can never observe
    /// its return while this callback is still running.
    pub fn invoke(&self, value: T) {
        let Some(core) = self.core.upgrade() else {
            return;
        };
        let guard = core
            .callback
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if core.connected.load(Ordering::SeqCst) {
            if let Some(callback) = guard.as_ref() {
                callback(value);
            }
        }
    }
}

impl<T> Clone for Callable<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T> PartialEq for Callable<T> {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.core, &other.core)
    }
}

impl<T> Eq for Callable<T> {}

impl<T> Debug for Callable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("connected", &self.is_connected())
            .finish()
    }
}
