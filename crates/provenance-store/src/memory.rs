//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use provenance_core::{AuthorStats, ContentRecord, Fingerprint, Principal, VerifierEntry};

use crate::batch::{Mutation, WriteBatch};
use crate::error::{Result, StoreError};
use crate::traits::{StateDump, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records indexed by fingerprint.
    records: HashMap<Fingerprint, ContentRecord>,

    /// Per-author counters.
    author_stats: HashMap<Principal, AuthorStats>,

    /// Position index: (author, seq) -> fingerprint.
    author_index: HashMap<(Principal, u64), Fingerprint>,

    /// Trusted-verifier flags.
    verifiers: HashMap<Principal, VerifierEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl MemoryStoreInner {
    /// Reject the batch if any put-if-absent key exists, either in the
    /// tables or earlier in the same batch.
    fn check(&self, batch: &WriteBatch) -> Result<()> {
        let mut staged_records = HashSet::new();
        let mut staged_index = HashSet::new();

        for mutation in batch.mutations() {
            let fresh = match mutation {
                Mutation::InsertRecord { fingerprint, .. } => {
                    !self.records.contains_key(fingerprint) && staged_records.insert(*fingerprint)
                }
                Mutation::InsertIndexEntry { author, seq, .. } => {
                    let key = (author.clone(), *seq);
                    !self.author_index.contains_key(&key) && staged_index.insert(key)
                }
                Mutation::PutAuthorStats { .. } | Mutation::PutVerifier { .. } => true,
            };

            if !fresh {
                return Err(StoreError::Conflict {
                    table: mutation.table(),
                    key: mutation.key(),
                });
            }
        }

        Ok(())
    }

    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::InsertRecord {
                fingerprint,
                record,
            } => {
                self.records.insert(fingerprint, record);
            }
            Mutation::InsertIndexEntry {
                author,
                seq,
                fingerprint,
            } => {
                self.author_index.insert((author, seq), fingerprint);
            }
            Mutation::PutAuthorStats { author, stats } => {
                self.author_stats.insert(author, stats);
            }
            Mutation::PutVerifier { verifier, entry } => {
                self.verifiers.insert(verifier, entry);
            }
        }
    }
}

impl Store for MemoryStore {
    fn get_record(&self, fingerprint: &Fingerprint) -> Result<Option<ContentRecord>> {
        Ok(self.read()?.records.get(fingerprint).cloned())
    }

    fn has_record(&self, fingerprint: &Fingerprint) -> Result<bool> {
        Ok(self.read()?.records.contains_key(fingerprint))
    }

    fn get_author_stats(&self, author: &Principal) -> Result<Option<AuthorStats>> {
        Ok(self.read()?.author_stats.get(author).copied())
    }

    fn get_index_entry(&self, author: &Principal, seq: u64) -> Result<Option<Fingerprint>> {
        Ok(self
            .read()?
            .author_index
            .get(&(author.clone(), seq))
            .copied())
    }

    fn get_verifier(&self, verifier: &Principal) -> Result<Option<VerifierEntry>> {
        Ok(self.read()?.verifiers.get(verifier).copied())
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut inner = self.write()?;

        // Validation happens under the same write lock as application, so no
        // reader ever sees a partial batch.
        if let Err(e) = inner.check(&batch) {
            tracing::warn!(error = %e, "rejected write batch");
            return Err(e);
        }

        let count = batch.len();
        for mutation in batch.into_mutations() {
            inner.apply(mutation);
        }

        tracing::debug!(mutations = count, "committed write batch");
        Ok(())
    }

    fn dump(&self) -> Result<StateDump> {
        let inner = self.read()?;
        Ok(StateDump {
            records: inner.records.iter().map(|(k, v)| (*k, v.clone())).collect(),
            author_stats: inner
                .author_stats
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            author_index: inner
                .author_index
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            verifiers: inner.verifiers.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Table;
    use provenance_core::{ClaimSignature, RegistrationRequest};

    fn make_record(author: &Principal, fp: Fingerprint) -> ContentRecord {
        let request = RegistrationRequest::builder(fp, ClaimSignature::ZERO)
            .content_type("article")
            .title("test")
            .build()
            .unwrap();
        ContentRecord::claim(&request, author.clone(), 10)
    }

    #[test]
    fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let alice = Principal::new("alice").unwrap();
        let fp = Fingerprint::from_bytes([1; 32]);

        let mut batch = WriteBatch::new();
        batch
            .insert_record(fp, make_record(&alice, fp))
            .insert_index_entry(alice.clone(), 0, fp)
            .put_author_stats(alice.clone(), AuthorStats::default().advanced(10));
        store.commit(batch).unwrap();

        assert!(store.has_record(&fp).unwrap());
        assert_eq!(store.get_index_entry(&alice, 0).unwrap(), Some(fp));
        assert_eq!(store.get_author_stats(&alice).unwrap().unwrap().content_count, 1);
        assert_eq!(store.get_index_entry(&alice, 1).unwrap(), None);
    }

    #[test]
    fn test_conflict_leaves_state_untouched() {
        let store = MemoryStore::new();
        let alice = Principal::new("alice").unwrap();
        let fp = Fingerprint::from_bytes([1; 32]);

        let mut first = WriteBatch::new();
        first.insert_record(fp, make_record(&alice, fp));
        store.commit(first).unwrap();
        let before = store.dump().unwrap();

        // Stats upsert comes first, then the conflicting insert.
        let mut second = WriteBatch::new();
        second
            .put_author_stats(alice.clone(), AuthorStats::default().advanced(11))
            .insert_record(fp, make_record(&alice, fp));
        let err = store.commit(second).unwrap_err();

        assert!(matches!(err, StoreError::Conflict { table: Table::Records, .. }));
        assert_eq!(store.dump().unwrap(), before);
    }

    #[test]
    fn test_duplicate_key_within_batch() {
        let store = MemoryStore::new();
        let alice = Principal::new("alice").unwrap();

        let mut batch = WriteBatch::new();
        batch
            .insert_index_entry(alice.clone(), 0, Fingerprint::from_bytes([1; 32]))
            .insert_index_entry(alice.clone(), 0, Fingerprint::from_bytes([2; 32]));

        let err = store.commit(batch).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { table: Table::AuthorIndex, .. }));
        assert_eq!(store.get_index_entry(&alice, 0).unwrap(), None);
    }

    #[test]
    fn test_upserts_overwrite() {
        let store = MemoryStore::new();
        let v = Principal::new("verifier-1").unwrap();

        let mut batch = WriteBatch::new();
        batch.put_verifier(v.clone(), VerifierEntry { active: true });
        store.commit(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.put_verifier(v.clone(), VerifierEntry { active: false });
        store.commit(batch).unwrap();

        assert_eq!(store.get_verifier(&v).unwrap(), Some(VerifierEntry { active: false }));
    }
}
