//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::cell::Cell;

use provenance_core::{
    ClaimSignature, Ed25519Verifier, Fingerprint, KeyDirectory, Keypair, LogicalTime, Principal,
    RegistrationRequest, VerifierEntry,
};
use provenance_registry::{ContentRegistry, RegistryConfig, Result};
use provenance_store::{MemoryStore, Store, WriteBatch};

/// Fingerprint content the way clients are expected to: BLAKE3 over the raw bytes.
pub fn fingerprint_of(content: &[u8]) -> Fingerprint {
    Fingerprint::from_bytes(*blake3::hash(content).as_bytes())
}

/// A registry over a memory store with signature checking enabled, plus a
/// clock that ticks once per registration.
pub struct TestFixture {
    pub registry: ContentRegistry<MemoryStore, Ed25519Verifier>,
    clock: Cell<LogicalTime>,
}

impl TestFixture {
    /// Create a new test fixture. Every principal made through
    /// [`principal`](Self::principal) gets a key derived from its name.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig {
            verify_signatures: true,
            ..Default::default()
        })
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let verifier = Ed25519Verifier::new(KeyDirectory::new());
        let registry = ContentRegistry::with_verifier(MemoryStore::new(), verifier, config)
            .expect("fixture config is valid");
        Self {
            registry,
            clock: Cell::new(1),
        }
    }

    /// Deterministic keypair for a principal name.
    pub fn keypair(name: &str) -> Keypair {
        Keypair::from_seed(blake3::hash(name.as_bytes()).as_bytes())
    }

    /// Create a principal and enroll its key with the verifier.
    pub fn principal(&self, name: &str) -> Principal {
        let principal = Principal::new(name).expect("valid principal name");
        self.registry
            .verifier()
            .directory()
            .insert(principal.clone(), Self::keypair(name).public_key())
            .expect("derived keys are valid Ed25519 points");
        principal
    }

    /// A signed request for `content`, claimed by `author`.
    pub fn request(&self, author: &Principal, content: &[u8]) -> RegistrationRequest {
        let fingerprint = fingerprint_of(content);
        let signature = Self::keypair(author.as_str()).sign_claim(&fingerprint, author);
        RegistrationRequest::builder(fingerprint, signature)
            .content_type("text")
            .title("fixture content")
            .build()
            .expect("fixture request is valid")
    }

    /// Register `content` as `author` at the next tick.
    pub fn register(&self, author: &Principal, content: &[u8]) -> Result<Fingerprint> {
        let now = self.tick();
        self.registry
            .register(self.request(author, content), author, now)
    }

    /// Register with an all-zero signature, which never verifies.
    pub fn register_unsigned(&self, author: &Principal, content: &[u8]) -> Result<Fingerprint> {
        let mut request = self.request(author, content);
        request.signature = ClaimSignature::ZERO;
        let now = self.tick();
        self.registry.register(request, author, now)
    }

    /// Mark a verifier active through the administrative write path.
    pub fn seed_verifier(&self, name: &str, active: bool) -> Principal {
        let verifier = Principal::new(name).expect("valid verifier name");
        let mut batch = WriteBatch::new();
        batch.put_verifier(verifier.clone(), VerifierEntry { active });
        self.registry
            .store()
            .commit(batch)
            .expect("memory store accepts upserts");
        verifier
    }

    /// Logical time the next registration will use.
    pub fn now(&self) -> LogicalTime {
        self.clock.get()
    }

    fn tick(&self) -> LogicalTime {
        let now = self.clock.get();
        self.clock.set(now + 1);
        now
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixture with `count` enrolled authors named `author-0`, `author-1`, ...
pub fn multi_author_fixture(count: usize) -> (TestFixture, Vec<Principal>) {
    let fixture = TestFixture::new();
    let authors = (0..count)
        .map(|i| fixture.principal(&format!("author-{}", i)))
        .collect();
    (fixture, authors)
}
