//! # Provenance Core
//!
//! Pure primitives for the provenance registry: fingerprints, authorship
//! records, and their canonical encoding.
//!
//! This crate contains no I/O, no storage, no clock. Caller identity and
//! logical time are plain values handed in by whoever hosts the registry.
//!
//! ## Key Types
//!
//! - [`Fingerprint`] - 32-byte content hash, the primary key of the registry
//! - [`Principal`] - Host-authenticated caller identity
//! - [`ClaimSignature`] - 65-byte signature blob recorded with a claim
//! - [`ContentRecord`] - What the registry stores per fingerprint
//! - [`AuthorStats`] - Per-author counter and last activity
//! - [`RegistrationRequest`] - Validated argument set for a registration
//!
//! ## Canonicalization
//!
//! Records are encoded using deterministic CBOR. See [`canonical`] module.
//!
//! ## Signatures
//!
//! The registry records signatures verbatim. Checking them is delegated to a
//! [`SignatureVerifier`]; see [`crypto`].

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod record;
pub mod text;
pub mod types;

pub use canonical::{
    decode_author_stats, decode_record, decode_verifier_entry, encode_author_stats,
    encode_record, encode_verifier_entry,
};
pub use crypto::{
    claim_message, AcceptAllVerifier, Ed25519Verifier, KeyDirectory, Keypair, SignatureVerifier,
    CLAIM_DOMAIN, ED25519_SCHEME_TAG,
};
pub use error::{CoreError, Result};
pub use record::{
    AuthorStats, ContentRecord, RegistrationRequest, RegistrationRequestBuilder, VerifierEntry,
    MAX_CONTENT_PER_AUTHOR, RECORD_VERSION,
};
pub use text::{ContentType, StorageUrl, Title};
pub use types::{ClaimSignature, Fingerprint, LogicalTime, Principal, MAX_PRINCIPAL_LEN};
