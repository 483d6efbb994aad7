//! uProtocol URIs: entity addresses and the filter patterns used to select
//! inbound messages.

use crate::datamodel::ustatus::{UCode, UStatus};
use std::fmt::{Display, Formatter};

/// Authority wildcard matching any authority name.
pub const WILDCARD_AUTHORITY: &str = "*";
/// Entity-id wildcard matching any uEntity instance and type.
pub const WILDCARD_ENTITY_ID: u32 = 0xFFFF_FFFF;
/// Major-version wildcard.
pub const WILDCARD_ENTITY_VERSION: u8 = 0xFF;
/// Resource-id wildcard.
pub const WILDCARD_RESOURCE_ID: u16 = 0xFFFF;

/// Address of a uEntity endpoint, also used as a filter pattern when any of
/// its segments carries the wildcard value for that segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UUri {
    pub authority_name: String,
    pub ue_id: u32,
    pub ue_version_major: u8,
    pub resource_id: u16,
}

impl UUri {
    pub fn try_from_parts(
        authority_name: &str,
        ue_id: u32,
        ue_version_major: u8,
        resource_id: u16,
    ) -> Result<Self, UStatus> {
        if authority_name.is_empty() {
            return Err(UStatus::fail_with_code(
                UCode::InvalidArgument,
                "authority name must not be empty",
            ));
        }
        Ok(Self {
            authority_name: authority_name.to_string(),
            ue_id,
            ue_version_major,
            resource_id,
        })
    }

    pub fn has_wildcard_authority(&self) -> bool {
        self.authority_name == WILDCARD_AUTHORITY
    }

    /// Returns true if `candidate` is selected by this URI used as a filter.
    ///
    /// A concrete segment matches only itself; a wildcard segment matches
    /// anything. A fully concrete filter therefore matches exactly one
    /// address.
    pub fn matches(&self, candidate: &UUri) -> bool {
        (self.has_wildcard_authority() || self.authority_name == candidate.authority_name)
            && (self.ue_id == WILDCARD_ENTITY_ID || self.ue_id == candidate.ue_id)
            && (self.ue_version_major == WILDCARD_ENTITY_VERSION
                || self.ue_version_major == candidate.ue_version_major)
            && (self.resource_id == WILDCARD_RESOURCE_ID
                || self.resource_id == candidate.resource_id)
    }
}

impl Display for UUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "//{}/{:X}/{:X}/{:X}",
            self.authority_name, self.ue_id, self.ue_version_major, self.resource_id
        )
    }
}
