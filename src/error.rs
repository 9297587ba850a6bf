//! Error types for the llink crate.

use thiserror::Error;

use crate::ffi::{
    error_name, ErrCode, MInt, LIBRARY_FUNCTION_ERROR, LIBRARY_MEMORY_ERROR,
    LIBRARY_VERSION_ERROR,
};
use crate::kind::VariantKind;

/// Result type alias for llink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for llink operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A container claiming ownership was created from a null handle.
    #[error("cannot create a generic {0} container from a null handle")]
    CreateFromNull(VariantKind),

    /// No host function table is registered for the requested container kind.
    #[error("host context unavailable")]
    HostContextUnavailable,

    /// The host table for a kind exists but lacks the required entry.
    #[error("host does not provide {function} for {kind}")]
    MissingHostFunction {
        /// Container kind.
        kind: VariantKind,
        /// Name of the missing table entry.
        function: &'static str,
    },

    /// The host table layout does not match this crate.
    #[error("host library version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this crate was built for.
        expected: MInt,
        /// Version reported by the host.
        found: MInt,
    },

    /// Allocating a new container failed on the host side.
    #[error("failed to create new {kind} ({})", code_name(.code))]
    NewFailed {
        /// Container kind.
        kind: VariantKind,
        /// Host status code.
        code: ErrCode,
    },

    /// Deep copy of a container failed on the host side.
    #[error("failed to clone {kind} ({})", code_name(.code))]
    CloneFailed {
        /// Container kind.
        kind: VariantKind,
        /// Host status code.
        code: ErrCode,
    },

    /// Element type conversion failed on the host side.
    #[error("failed to convert {kind}: {reason}")]
    ConversionFailed {
        /// Container kind.
        kind: VariantKind,
        /// Description of the requested conversion.
        reason: String,
    },

    /// A sparse array operation failed on the host side.
    #[error("sparse array {op} failed ({})", code_name(.code))]
    SparseArrayFailed {
        /// Operation that failed.
        op: &'static str,
        /// Host status code.
        code: ErrCode,
    },

    /// Passing mode name not recognized.
    #[error("unknown passing mode: {0}")]
    UnknownPassingMode(String),

    /// Function argument is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn code_name(code: &ErrCode) -> &'static str {
    error_name(*code)
}

impl Error {
    /// Host status code to report when this error ends a library function.
    pub fn error_code(&self) -> ErrCode {
        match self {
            Error::NewFailed { code, .. }
            | Error::CloneFailed { code, .. }
            | Error::SparseArrayFailed { code, .. } => *code,
            Error::VersionMismatch { .. } => LIBRARY_VERSION_ERROR,
            Error::CreateFromNull(_) => LIBRARY_MEMORY_ERROR,
            Error::HostContextUnavailable
            | Error::MissingHostFunction { .. }
            | Error::ConversionFailed { .. }
            | Error::UnknownPassingMode(_)
            | Error::InvalidArgument(_) => LIBRARY_FUNCTION_ERROR,
        }
    }

    /// Check if this is a create-from-null error.
    pub fn is_create_from_null(&self) -> bool {
        matches!(self, Error::CreateFromNull(_))
    }

    /// Check if the host context (or one of its tables) was missing.
    pub fn is_host_unavailable(&self) -> bool {
        matches!(
            self,
            Error::HostContextUnavailable | Error::MissingHostFunction { .. }
        )
    }

    /// Check if the host failed to allocate or copy a container.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, Error::NewFailed { .. } | Error::CloneFailed { .. })
    }
}
