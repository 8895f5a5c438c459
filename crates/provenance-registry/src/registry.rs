//! The ContentRegistry: first-claim authorship over content fingerprints.

use std::sync::Arc;

use provenance_core::{
    AcceptAllVerifier, ContentRecord, Fingerprint, LogicalTime, Principal, RegistrationRequest,
    SignatureVerifier,
};
use provenance_store::{Store, StoreError, Table, WriteBatch};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::index::AuthorIndex;
use crate::verifiers::VerifierRegistry;

/// The registry state machine.
///
/// Callers must serialize operations; see [`LedgerHost`](crate::LedgerHost)
/// for a host that does.
pub struct ContentRegistry<S: Store, V: SignatureVerifier = AcceptAllVerifier> {
    /// The storage backend.
    store: Arc<S>,
    /// Checks claim signatures when `config.verify_signatures` is set.
    verifier: V,
    /// Configuration.
    config: RegistryConfig,
    index: AuthorIndex<S>,
    verifiers: VerifierRegistry<S>,
}

impl<S: Store> ContentRegistry<S> {
    /// Create a registry that accepts any signature.
    pub fn new(store: S, config: RegistryConfig) -> Result<Self> {
        Self::with_verifier(store, AcceptAllVerifier, config)
    }
}

impl<S: Store, V: SignatureVerifier> ContentRegistry<S, V> {
    /// Create a registry with a signature verifier.
    pub fn with_verifier(store: S, verifier: V, config: RegistryConfig) -> Result<Self> {
        Self::from_shared(Arc::new(store), verifier, config)
    }

    /// Create a registry over a store that is also held elsewhere.
    pub fn from_shared(store: Arc<S>, verifier: V, config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index: AuthorIndex::new(Arc::clone(&store)),
            verifiers: VerifierRegistry::new(Arc::clone(&store)),
            store,
            verifier,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    pub fn author_index(&self) -> &AuthorIndex<S> {
        &self.index
    }

    pub fn verifiers(&self) -> &VerifierRegistry<S> {
        &self.verifiers
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Claim `request.fingerprint` for `caller` at logical time `now`.
    ///
    /// Checks, in order: the fingerprint is unclaimed, the caller is under
    /// quota, and (when enabled) the signature verifies. The record, the
    /// index entry and the stats upsert are then committed as one batch.
    /// On any error nothing is written.
    pub fn register(
        &self,
        request: RegistrationRequest,
        caller: &Principal,
        now: LogicalTime,
    ) -> Result<Fingerprint> {
        let fingerprint = request.fingerprint;

        if self.store.has_record(&fingerprint)? {
            tracing::warn!(%fingerprint, author = %caller, "fingerprint already registered");
            return Err(RegistryError::AlreadyRegistered(fingerprint));
        }

        let stats = self.index.get_stats(caller)?;
        let limit = self.config.max_content_per_author;
        if stats.content_count >= limit {
            tracing::warn!(%fingerprint, author = %caller, limit, "content limit reached");
            return Err(RegistryError::ContentLimitReached {
                author: caller.clone(),
                limit,
            });
        }

        if self.config.verify_signatures
            && !self
                .verifier
                .verify(&fingerprint, &request.signature, caller)
        {
            tracing::warn!(%fingerprint, author = %caller, "signature rejected");
            return Err(RegistryError::InvalidSignature {
                fingerprint,
                signer: caller.clone(),
            });
        }

        let record = ContentRecord::claim(&request, caller.clone(), now);
        let mut batch = WriteBatch::new();
        batch.insert_record(fingerprint, record);
        let seq = AuthorIndex::<S>::stage_append(&mut batch, caller, stats, fingerprint, now);

        match self.store.commit(batch) {
            Ok(()) => {}
            Err(StoreError::Conflict {
                table: Table::Records,
                ..
            }) => return Err(RegistryError::AlreadyRegistered(fingerprint)),
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(%fingerprint, author = %caller, seq, timestamp = now, "registered content");
        Ok(fingerprint)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// The record behind `fingerprint`.
    pub fn verify(&self, fingerprint: &Fingerprint) -> Result<ContentRecord> {
        self.store
            .get_record(fingerprint)?
            .ok_or(RegistryError::NotFound(*fingerprint))
    }

    /// See [`AuthorIndex::get_entry_at`].
    pub fn get_entry_at(&self, author: &Principal, index: u64) -> Result<Option<Fingerprint>> {
        self.index.get_entry_at(author, index)
    }

    /// See [`AuthorIndex::get_stats`].
    pub fn get_stats(&self, author: &Principal) -> Result<provenance_core::AuthorStats> {
        self.index.get_stats(author)
    }
}
