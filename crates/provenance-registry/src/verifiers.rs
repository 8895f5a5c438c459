//! Trusted-verifier table.
//!
//! Storage for `verifier -> active` flags. Nothing in the registry writes or
//! consults it; entries only arrive through an administrative
//! [`WriteBatch::put_verifier`](provenance_store::WriteBatch::put_verifier).

use std::sync::Arc;

use provenance_core::{Principal, VerifierEntry};
use provenance_store::Store;

use crate::error::Result;

/// Read-only view of the verifier table.
pub struct VerifierRegistry<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for VerifierRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> VerifierRegistry<S> {
    pub(crate) fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn get(&self, verifier: &Principal) -> Result<Option<VerifierEntry>> {
        Ok(self.store.get_verifier(verifier)?)
    }

    /// True only for a stored entry with `active` set.
    pub fn is_active(&self, verifier: &Principal) -> Result<bool> {
        Ok(self.get(verifier)?.map_or(false, |entry| entry.active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provenance_store::{MemoryStore, WriteBatch};

    #[test]
    fn test_verifier_lookup() {
        let store = Arc::new(MemoryStore::new());
        let v1 = Principal::new("verifier-1").unwrap();
        let v2 = Principal::new("verifier-2").unwrap();

        let mut batch = WriteBatch::new();
        batch
            .put_verifier(v1.clone(), VerifierEntry { active: true })
            .put_verifier(v2.clone(), VerifierEntry { active: false });
        store.commit(batch).unwrap();

        let verifiers = VerifierRegistry::new(store);
        assert!(verifiers.is_active(&v1).unwrap());
        assert!(!verifiers.is_active(&v2).unwrap());
        assert_eq!(verifiers.get(&v2).unwrap(), Some(VerifierEntry { active: false }));

        let unknown = Principal::new("nobody").unwrap();
        assert_eq!(verifiers.get(&unknown).unwrap(), None);
        assert!(!verifiers.is_active(&unknown).unwrap());
    }
}
