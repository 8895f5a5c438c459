//! Store trait: the abstract interface for registry persistence.
//!
//! This trait allows the registry to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::collections::BTreeMap;

use provenance_core::{
    encode_author_stats, encode_record, encode_verifier_entry, AuthorStats, ContentRecord,
    Fingerprint, Principal, VerifierEntry,
};

use crate::batch::WriteBatch;
use crate::error::Result;

/// The Store trait: synchronous interface over the registry tables.
///
/// # Design Notes
///
/// - **Exact-match keys**: there are no range scans beyond `(author, seq)`
///   point lookups.
/// - **Atomic commits**: [`commit`](Store::commit) applies the whole batch or
///   nothing. A put-if-absent hit returns
///   [`StoreError::Conflict`](crate::StoreError::Conflict) and leaves every
///   table untouched.
/// - **Single writer**: callers serialize commits; implementations only
///   guarantee that one commit is never observed half-applied.
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the record stored under a fingerprint.
    fn get_record(&self, fingerprint: &Fingerprint) -> Result<Option<ContentRecord>>;

    /// Check if a fingerprint is registered.
    fn has_record(&self, fingerprint: &Fingerprint) -> Result<bool> {
        Ok(self.get_record(fingerprint)?.is_some())
    }

    /// Get an author's stats, if the author has registered anything.
    fn get_author_stats(&self, author: &Principal) -> Result<Option<AuthorStats>>;

    /// Get the fingerprint at position `seq` of an author's index.
    fn get_index_entry(&self, author: &Principal, seq: u64) -> Result<Option<Fingerprint>>;

    /// Get a verifier entry.
    fn get_verifier(&self, verifier: &Principal) -> Result<Option<VerifierEntry>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply every mutation in `batch`, or none of them.
    fn commit(&self, batch: WriteBatch) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot every table in key order.
    fn dump(&self) -> Result<StateDump>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Author stats, defaulting to zero count and zero activity.
    fn stats_or_default(&self, author: &Principal) -> Result<AuthorStats> {
        Ok(self.get_author_stats(author)?.unwrap_or_default())
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Ordered snapshot of all four tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDump {
    pub records: BTreeMap<Fingerprint, ContentRecord>,
    pub author_stats: BTreeMap<Principal, AuthorStats>,
    pub author_index: BTreeMap<(Principal, u64), Fingerprint>,
    pub verifiers: BTreeMap<Principal, VerifierEntry>,
}

impl StateDump {
    /// Deterministic byte encoding of the whole state.
    ///
    /// Two stores holding the same logical state produce identical bytes,
    /// whatever their backend.
    ///
    /// Format, per table in the order records, author stats, author index,
    /// verifiers: `u64 BE entry count` followed by each entry as
    /// `u32 BE key length || key || u32 BE value length || value`. Values use
    /// the canonical CBOR encoders; index keys are `author || u64 BE seq`.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        put_count(&mut buf, self.records.len());
        for (fingerprint, record) in &self.records {
            put_entry(&mut buf, fingerprint.as_bytes(), &encode_record(record));
        }

        put_count(&mut buf, self.author_stats.len());
        for (author, stats) in &self.author_stats {
            put_entry(&mut buf, author.as_bytes(), &encode_author_stats(stats));
        }

        put_count(&mut buf, self.author_index.len());
        for ((author, seq), fingerprint) in &self.author_index {
            let mut key = author.as_bytes().to_vec();
            key.extend_from_slice(&seq.to_be_bytes());
            put_entry(&mut buf, &key, fingerprint.as_bytes());
        }

        put_count(&mut buf, self.verifiers.len());
        for (verifier, entry) in &self.verifiers {
            put_entry(&mut buf, verifier.as_bytes(), &encode_verifier_entry(entry));
        }

        buf
    }

    /// Fingerprints indexed for `author`, in sequence order.
    pub fn index_of(&self, author: &Principal) -> Vec<(u64, Fingerprint)> {
        self.author_index
            .iter()
            .filter(|((a, _), _)| a == author)
            .map(|((_, seq), fp)| (*seq, *fp))
            .collect()
    }
}

fn put_count(buf: &mut Vec<u8>, n: usize) {
    buf.extend_from_slice(&(n as u64).to_be_bytes());
}

fn put_entry(buf: &mut Vec<u8>, key: &[u8], value: &[u8]) {
    buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
    buf.extend_from_slice(value);
}
