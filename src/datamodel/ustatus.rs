//! Status codes and the `UStatus` value carried across every transport boundary.

use thiserror::Error;

/// Closed set of uProtocol status codes.
///
/// These mirror the canonical protocol code set and are propagated verbatim:
/// the core never remaps a code reported by a backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UCode {
    #[default]
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Unauthenticated,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
}

/// Outcome of a transport-boundary operation: a [`UCode`] plus an optional
/// human-readable message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("{code:?}: {}", .message.as_deref().unwrap_or("(no message)"))]
pub struct UStatus {
    pub code: UCode,
    pub message: Option<String>,
}

impl UStatus {
    pub fn ok() -> Self {
        Self {
            code: UCode::Ok,
            message: None,
        }
    }

    pub fn fail_with_code<M: Into<String>>(code: UCode, message: M) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.code != UCode::Ok
    }

    pub fn code(&self) -> UCode {
        self.code
    }
}
