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

//! Monotonic builder for uProtocol UUIDv8 identifiers.
//!
//! Production builders share one process-wide `(timestamp, counter)` state so
//! that identifiers stamped anywhere in the process stay totally ordered by
//! `(timestamp, counter)`. Test builders can substitute the time and random
//! sources and detach to private state for deterministic sequences.

use crate::datamodel::ustatus::{UCode, UStatus};
use crate::datamodel::uuid::{
    UUID, UUID_COUNTER_MASK, UUID_RANDOM_MASK, UUID_TIMESTAMP_MASK, UUID_TIMESTAMP_SHIFT,
    UUID_VARIANT_RFC4122, UUID_VARIANT_SHIFT, UUID_VERSION_8, UUID_VERSION_SHIFT,
};
use lazy_static::lazy_static;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

const UUID_BUILDER_TAG: &str = "UuidBuilder:";

/// Largest value the 12-bit counter can hold; the counter saturates here
/// instead of wrapping.
const UUID_COUNTER_MAX: u16 = UUID_COUNTER_MASK as u16;

/// Function-valued time source, returning milliseconds since the unix epoch.
pub type TimeSource = Arc<dyn Fn() -> u64 + Send + Sync>;
/// Function-valued entropy source, returning 64 random bits per call.
pub type RandomSource = Arc<dyn Fn() -> u64 + Send + Sync>;

#[derive(Debug, Default)]
struct UuidSharedState {
    last_unix_ts_ms: u64,
    counter: u16,
}

lazy_static! {
    static ref PROCESS_WIDE_STATE: Arc<Mutex<UuidSharedState>> =
        Arc::new(Mutex::new(UuidSharedState::default()));
}

/// Builds time-ordered UUIDv8 identifiers.
///
/// Every identifier from one builder state satisfies: the msb word is
/// non-decreasing, and within one millisecond tick the counter advances by
/// exactly 1 until it saturates at 4095.
#[derive(Clone)]
pub struct UuidBuilder {
    testing: bool,
    time_source: Option<TimeSource>,
    random_source: Option<RandomSource>,
    state: Arc<Mutex<UuidSharedState>>,
}

impl core::fmt::Debug for UuidBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UuidBuilder")
            .field("testing", &self.testing)
            .field("time_source", &self.time_source.as_ref().map(|_| "<fn>"))
            .field("random_source", &self.random_source.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl UuidBuilder {
    /// Creates a production builder: system time, `rand` entropy, and the
    /// process-wide shared counter state.
    pub fn new() -> Self {
        Self {
            testing: false,
            time_source: None,
            random_source: None,
            state: PROCESS_WIDE_STATE.clone(),
        }
    }

    /// Creates a test builder that accepts substituted sources and detached
    /// state. Until detached it still shares the process-wide state.
    pub fn for_testing() -> Self {
        Self {
            testing: true,
            ..Self::new()
        }
    }

    /// Substitutes the time source. Rejected with `FailedPrecondition` on a
    /// production builder, leaving the builder unaltered.
    pub fn with_time_source<F>(self, time_source: F) -> Result<Self, UStatus>
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        if !self.testing {
            return Err(UStatus::fail_with_code(
                UCode::FailedPrecondition,
                format!("{UUID_BUILDER_TAG} cannot set time source on a non-test builder"),
            ));
        }
        Ok(Self {
            time_source: Some(Arc::new(time_source)),
            ..self
        })
    }

    /// Substitutes the entropy source. Rejected with `FailedPrecondition` on
    /// a production builder, leaving the builder unaltered.
    pub fn with_random_source<F>(self, random_source: F) -> Result<Self, UStatus>
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        if !self.testing {
            return Err(UStatus::fail_with_code(
                UCode::FailedPrecondition,
                format!("{UUID_BUILDER_TAG} cannot set random source on a non-test builder"),
            ));
        }
        Ok(Self {
            random_source: Some(Arc::new(random_source)),
            ..self
        })
    }

    /// Detaches the builder to private, unshared `(timestamp, counter)`
    /// state. Rejected with `FailedPrecondition` on a production builder.
    pub fn with_independent_state(self) -> Result<Self, UStatus> {
        if !self.testing {
            return Err(UStatus::fail_with_code(
                UCode::FailedPrecondition,
                format!("{UUID_BUILDER_TAG} cannot set independent state on a non-test builder"),
            ));
        }
        Ok(Self {
            state: Arc::new(Mutex::new(UuidSharedState::default())),
            ..self
        })
    }

    /// Builds the next identifier.
    ///
    /// A strictly greater timestamp than the last observed one resets the
    /// counter; the same tick increments it until it saturates at 4095. A
    /// regressing clock is treated as the same-tick case: the timestamp field
    /// holds at the last observed value and the counter keeps advancing, so
    /// the msb word never decreases.
    pub fn build(&self) -> UUID {
        let now_ms = match &self.time_source {
            Some(time_source) => time_source(),
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or(0),
        } & UUID_TIMESTAMP_MASK;

        let (timestamp_ms, counter) = {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if now_ms > state.last_unix_ts_ms {
                state.last_unix_ts_ms = now_ms;
                state.counter = 0;
            } else if state.counter < UUID_COUNTER_MAX {
                state.counter += 1;
            }
            (state.last_unix_ts_ms, state.counter)
        };

        let random = match &self.random_source {
            Some(random_source) => random_source(),
            None => rand::random::<u64>(),
        } & UUID_RANDOM_MASK;

        let msb = (timestamp_ms << UUID_TIMESTAMP_SHIFT)
            | (UUID_VERSION_8 << UUID_VERSION_SHIFT)
            | u64::from(counter);
        let lsb = (UUID_VARIANT_RFC4122 << UUID_VARIANT_SHIFT) | random;
        UUID::new(msb, lsb)
    }
}

impl Default for UuidBuilder {
    fn default() -> Self {
        Self::new()
    }
}
