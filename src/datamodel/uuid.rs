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

//! 128-bit, time-ordered uProtocol identifiers (UUIDv8).
//!
//! Layout of the two 64-bit words:
//!
//! ```text
//! msb: [48-bit unix timestamp, ms][4-bit version = 8][12-bit counter]
//! lsb: [2-bit variant = 0b10][14-bit zero][48-bit random]
//! ```

use std::fmt::{Display, Formatter};

pub(crate) const UUID_TIMESTAMP_SHIFT: u32 = 16;
pub(crate) const UUID_TIMESTAMP_MASK: u64 = 0xFFFF_FFFF_FFFF;
pub(crate) const UUID_VERSION_SHIFT: u32 = 12;
pub(crate) const UUID_VERSION_MASK: u64 = 0xF;
pub(crate) const UUID_VERSION_8: u64 = 0x8;
pub(crate) const UUID_COUNTER_MASK: u64 = 0xFFF;
pub(crate) const UUID_VARIANT_SHIFT: u32 = 62;
pub(crate) const UUID_VARIANT_MASK: u64 = 0x3;
pub(crate) const UUID_VARIANT_RFC4122: u64 = 0b10;
pub(crate) const UUID_RANDOM_MASK: u64 = 0xFFFF_FFFF_FFFF;

/// A uProtocol message identifier.
///
/// Identifiers produced in sequence from one [`crate::UuidBuilder`] are
/// totally ordered by `(timestamp, counter)`; see the builder for the
/// generation rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UUID {
    pub msb: u64,
    pub lsb: u64,
}

impl UUID {
    pub fn new(msb: u64, lsb: u64) -> Self {
        Self { msb, lsb }
    }

    /// Milliseconds since the unix epoch recorded in the timestamp field.
    pub fn timestamp_ms(&self) -> u64 {
        self.msb >> UUID_TIMESTAMP_SHIFT
    }

    /// Value of the 12-bit same-tick counter field.
    pub fn counter(&self) -> u16 {
        (self.msb & UUID_COUNTER_MASK) as u16
    }

    pub fn version(&self) -> u8 {
        ((self.msb >> UUID_VERSION_SHIFT) & UUID_VERSION_MASK) as u8
    }

    pub fn variant(&self) -> u8 {
        ((self.lsb >> UUID_VARIANT_SHIFT) & UUID_VARIANT_MASK) as u8
    }

    /// Checks the fixed version and variant bits that every identifier
    /// produced by this crate carries.
    pub fn is_uprotocol_uuid(&self) -> bool {
        self.version() as u64 == UUID_VERSION_8 && self.variant() as u64 == UUID_VARIANT_RFC4122
    }

    pub fn to_hyphenated_string(&self) -> String {
        uuid::Uuid::from_u64_pair(self.msb, self.lsb)
            .hyphenated()
            .to_string()
    }
}

impl Display for UUID {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hyphenated_string())
    }
}
