//! # Provenance Registry
//!
//! Binds a content fingerprint to an authorship claim: who registered it,
//! at what logical time, with what metadata. The first claim wins; nobody
//! can register the same fingerprint again.
//!
//! ## Overview
//!
//! - **Uniqueness**: a fingerprint is registered at most once, across all authors
//! - **Quota**: an author may register at most 100 fingerprints
//! - **Author index**: each author's fingerprints are numbered 0, 1, 2, ... with
//!   no gaps, for pagination
//! - **Verification**: anyone can look up the record behind a fingerprint
//!
//! Caller identity and logical time are explicit arguments. The host that
//! embeds the registry authenticates callers, supplies the clock, and
//! serializes operations; [`LedgerHost`] is a ready-made async host.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use provenance_registry::{ContentRegistry, RegistryConfig};
//! use provenance_registry::core::{ClaimSignature, Fingerprint, Principal, RegistrationRequest};
//! use provenance_registry::store::SqliteStore;
//!
//! let store = SqliteStore::open("registry.db").unwrap();
//! let registry = ContentRegistry::new(store, RegistryConfig::default()).unwrap();
//!
//! let alice = Principal::new("alice").unwrap();
//! let fingerprint = Fingerprint::from_bytes([0xaa; 32]);
//! let request = RegistrationRequest::builder(fingerprint, ClaimSignature::ZERO)
//!     .content_type("article")
//!     .title("Hello World")
//!     .build()
//!     .unwrap();
//!
//! registry.register(request, &alice, 1).unwrap();
//! let record = registry.verify(&fingerprint).unwrap();
//! assert_eq!(record.author, alice);
//! ```
//!
//! ## Re-exports
//!
//! - `provenance_registry::core` - Core primitives (Fingerprint, ContentRecord, etc.)
//! - `provenance_registry::store` - Storage abstraction and SQLite

pub mod config;
pub mod error;
pub mod host;
pub mod index;
pub mod logging;
pub mod registry;
pub mod verifiers;

// Re-export component crates
pub use provenance_core as core;
pub use provenance_store as store;

// Re-export main types for convenience
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use host::LedgerHost;
pub use index::AuthorIndex;
pub use logging::{init_logging, LogFormat};
pub use registry::ContentRegistry;
pub use verifiers::VerifierRegistry;

// Re-export commonly used core types
pub use provenance_core::{
    AuthorStats, ClaimSignature, ContentRecord, Fingerprint, LogicalTime, Principal,
    RegistrationRequest, MAX_CONTENT_PER_AUTHOR,
};
