//! Error types for the provenance core.

use thiserror::Error;

/// Errors raised while constructing or decoding core values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// An argument has the wrong shape (length, charset, emptiness).
    #[error("invalid parameter {field}: {reason}")]
    InvalidParams {
        field: &'static str,
        reason: String,
    },

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("malformed {kind}: {reason}")]
    Malformed {
        kind: &'static str,
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidParams {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        CoreError::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
