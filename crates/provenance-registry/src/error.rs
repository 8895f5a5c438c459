//! Error types for the registry.

use provenance_core::{CoreError, Fingerprint, Principal};
use provenance_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
///
/// Every failure is detected before any write, so an error always means the
/// call had no effect.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The caller may not perform this operation.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The fingerprint is already claimed.
    #[error("fingerprint already registered: {}", .0.to_hex())]
    AlreadyRegistered(Fingerprint),

    /// No record exists for the fingerprint.
    #[error("fingerprint not found: {}", .0.to_hex())]
    NotFound(Fingerprint),

    /// Signature verification is enabled and the signature did not verify.
    #[error("invalid signature over {} by {signer}", .fingerprint.to_hex())]
    InvalidSignature {
        fingerprint: Fingerprint,
        signer: Principal,
    },

    /// The author has used up their quota.
    #[error("content limit reached for {author}: {limit} registrations")]
    ContentLimitReached { author: Principal, limit: u64 },

    /// Malformed or out-of-range arguments.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The embedding host failed to run the operation.
    #[error("host error: {0}")]
    Host(String),
}

impl RegistryError {
    /// Stable numeric code for surfacing failures across a host boundary.
    pub fn code(&self) -> u32 {
        match self {
            RegistryError::Unauthorized(_) => 100,
            RegistryError::AlreadyRegistered(_) => 101,
            RegistryError::NotFound(_) => 102,
            RegistryError::InvalidSignature { .. } => 103,
            RegistryError::ContentLimitReached { .. } => 104,
            RegistryError::InvalidParams(_) => 105,
            RegistryError::Store(_) | RegistryError::Host(_) => 500,
        }
    }
}

impl From<CoreError> for RegistryError {
    fn from(e: CoreError) -> Self {
        RegistryError::InvalidParams(e.to_string())
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
