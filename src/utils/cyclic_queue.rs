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

//! Bounded FIFO queue with a timeout-aware blocking pop.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default bound on how long [`CyclicQueue::wait_pop`] blocks for an item.
pub const DEFAULT_POP_TIMEOUT: Duration = Duration::from_millis(5);

/// Fixed-capacity concurrent queue.
///
/// `push` never blocks; `wait_pop` blocks the calling thread until an item
/// arrives or the configured timeout elapses. Items are owned by the queue
/// from push until popped and leave in FIFO order.
#[derive(Debug)]
pub struct CyclicQueue<T> {
    max_size: usize,
    pop_timeout: Duration,
    queue: Mutex<VecDeque<T>>,
    item_available: Condvar,
}

impl<T> CyclicQueue<T> {
    /// Creates a queue holding at most `max_size` items, with the default
    /// 5 ms pop timeout.
    pub fn new(max_size: usize) -> Self {
        Self::with_timeout(max_size, DEFAULT_POP_TIMEOUT)
    }

    pub fn with_timeout(max_size: usize, pop_timeout: Duration) -> Self {
        Self {
            max_size,
            pop_timeout,
            queue: Mutex::new(VecDeque::with_capacity(max_size)),
            item_available: Condvar::new(),
        }
    }

    fn guard(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues `data` unless the queue is full. Returns `false` without
    /// side effects when full; otherwise signals one waiting popper.
    pub fn push(&self, data: T) -> bool {
        let mut queue = self.guard();
        if queue.len() >= self.max_size {
            return false;
        }
        queue.push_back(data);
        drop(queue);
        self.item_available.notify_one();
        true
    }

    /// Dequeues the oldest item, blocking up to the configured timeout.
    /// Returns `None` when the deadline passes with the queue still empty.
    pub fn wait_pop(&self) -> Option<T> {
        let guard = self.guard();
        let (mut queue, _timeout) = self
            .item_available
            .wait_timeout_while(guard, self.pop_timeout, |queue| queue.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        queue.pop_front()
    }

    /// Best-effort snapshot; may be stale as soon as it returns under
    /// concurrent pushes and pops.
    pub fn is_full(&self) -> bool {
        self.guard().len() >= self.max_size
    }

    /// Best-effort snapshot; see [`CyclicQueue::is_full`].
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Best-effort snapshot; see [`CyclicQueue::is_full`].
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Discards all queued items in one atomic step.
    pub fn clear(&self) {
        self.guard().clear();
    }
}
