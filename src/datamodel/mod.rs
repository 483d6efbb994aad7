//! Boundary datamodel shared by the transport core and its collaborators.

pub mod umessage;
pub mod ustatus;
pub mod uuid;
pub mod uuid_builder;
pub mod uuri;
