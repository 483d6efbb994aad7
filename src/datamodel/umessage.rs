//! Message envelope and the builder that stamps outgoing messages with
//! time-ordered identifiers.

use crate::datamodel::ustatus::{UCode, UStatus};
use crate::datamodel::uuid::UUID;
use crate::datamodel::uuid_builder::UuidBuilder;
use crate::datamodel::uuri::UUri;
use bytes::Bytes;

/// Kind of traffic an envelope carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UMessageType {
    #[default]
    Publish,
    Notification,
}

/// Delivery metadata stamped on every message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UAttributes {
    pub id: UUID,
    pub type_: UMessageType,
    pub source: UUri,
    pub sink: Option<UUri>,
}

/// An envelope exchanged through a transport: attributes plus an optional
/// raw payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UMessage {
    pub attributes: UAttributes,
    pub payload: Option<Bytes>,
}

/// Assembles well-formed envelopes, stamping each with an identifier from a
/// [`UuidBuilder`].
pub struct UMessageBuilder {
    type_: UMessageType,
    source: UUri,
    sink: Option<UUri>,
    payload: Option<Bytes>,
}

impl UMessageBuilder {
    /// Starts a publish message on `topic`.
    pub fn publish(topic: UUri) -> Self {
        Self {
            type_: UMessageType::Publish,
            source: topic,
            sink: None,
            payload: None,
        }
    }

    /// Starts a notification from `source` addressed to `sink`.
    pub fn notification(source: UUri, sink: UUri) -> Self {
        Self {
            type_: UMessageType::Notification,
            source,
            sink: Some(sink),
            payload: None,
        }
    }

    pub fn with_payload<P: Into<Bytes>>(mut self, payload: P) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Builds the message, stamping it through the shared production
    /// identifier state.
    pub fn build(self) -> Result<UMessage, UStatus> {
        self.build_with(&UuidBuilder::new())
    }

    /// Builds the message with an explicit identifier builder. Tests pass a
    /// detached test builder here for reproducible stamps.
    pub fn build_with(self, uuid_builder: &UuidBuilder) -> Result<UMessage, UStatus> {
        if self.source.has_wildcard_authority() {
            return Err(UStatus::fail_with_code(
                UCode::InvalidArgument,
                "message source must be a concrete address, not a filter",
            ));
        }
        Ok(UMessage {
            attributes: UAttributes {
                id: uuid_builder.build(),
                type_: self.type_,
                source: self.source,
                sink: self.sink,
            },
            payload: self.payload,
        })
    }
}
