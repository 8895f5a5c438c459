//! # Provenance Testkit
//!
//! Testing utilities for the provenance registry.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known records with their expected canonical bytes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the stored encoding of records:
//!
//! ```rust
//! use provenance_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use provenance_testkit::generators::registration_request;
//!
//! proptest! {
//!     #[test]
//!     fn register_then_verify(request in registration_request()) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use provenance_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let alice = fixture.principal("alice");
//! let fp = fixture.register(&alice, b"some content").unwrap();
//! assert_eq!(fixture.registry.verify(&fp).unwrap().author, alice);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fingerprint_of, multi_author_fixture, TestFixture};
pub use generators::{fingerprint, principal, registration_request};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
