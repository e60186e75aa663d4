//! Unified error type for access_gate.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.
//!
//! None of these are fatal to the access sequence: the coordinator logs
//! them and still reaches [`Stage::Done`](crate::coordinator::Stage::Done).

use core::fmt;

use crate::coordinator::Stage;
use crate::host::Capability;

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The user (or platform) refused a capability. Informational.
    PermissionDenied(Capability),

    /// A host callback arrived while the coordinator was in another stage.
    ProtocolViolation {
        /// Stage the callback is only valid in.
        expected: Stage,
        /// Stage the coordinator was actually in.
        actual: Stage,
    },

    /// The host has no runtime model for this capability; it is held
    /// implicitly.
    HostApiUnavailable(Capability),

    /// Gate store read/write failed.
    Storage(StorageError),
}

/// Gate store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Backing storage could not be read.
    Read,
    /// Backing storage could not be written.
    Write,
    /// A stored record exists but does not decode.
    Corrupt,
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::Storage(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PermissionDenied(cap) => write!(f, "permission denied: {:?}", cap),
            Error::ProtocolViolation { expected, actual } => write!(
                f,
                "protocol violation: expected {:?}, was {:?}",
                expected, actual
            ),
            Error::HostApiUnavailable(cap) => write!(f, "host api unavailable: {:?}", cap),
            Error::Storage(e) => write!(f, "gate storage error: {:?}", e),
        }
    }
}
