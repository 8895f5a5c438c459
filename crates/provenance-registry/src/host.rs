//! An async host for the registry.
//!
//! [`LedgerHost`] plays the part of the execution environment: it owns the
//! logical clock (a block height) and runs one registry operation at a time.
//! Each operation runs on tokio's blocking pool, since stores do synchronous
//! I/O.

use std::sync::Arc;

use tokio::sync::Mutex;

use provenance_core::{
    AuthorStats, ContentRecord, Fingerprint, LogicalTime, Principal, RegistrationRequest,
    SignatureVerifier,
};
use provenance_store::Store;

use crate::error::{RegistryError, Result};
use crate::registry::ContentRegistry;

/// Serializes registry calls and supplies logical time.
///
/// Holding the clock lock for the duration of an operation gives every call
/// a place in a single total order, and every registration in one block
/// shares that block's height. The lock travels with the blocking task, so
/// a caller that stops waiting (timeout, `select!`, abort) does not let the
/// next call start until the abandoned one has finished.
pub struct LedgerHost<S: Store, V: SignatureVerifier> {
    registry: Arc<ContentRegistry<S, V>>,
    height: Arc<Mutex<LogicalTime>>,
}

impl<S, V> LedgerHost<S, V>
where
    S: Store + 'static,
    V: SignatureVerifier + 'static,
{
    /// Create a host starting at block height `genesis`.
    pub fn new(registry: ContentRegistry<S, V>, genesis: LogicalTime) -> Self {
        Self {
            registry: Arc::new(registry),
            height: Arc::new(Mutex::new(genesis)),
        }
    }

    pub fn registry(&self) -> &ContentRegistry<S, V> {
        &self.registry
    }

    /// Current block height.
    pub async fn height(&self) -> LogicalTime {
        *self.height.lock().await
    }

    /// Move the clock forward by `blocks`. Returns the new height.
    pub async fn advance(&self, blocks: u64) -> Result<LogicalTime> {
        let mut height = self.height.lock().await;
        *height = height
            .checked_add(blocks)
            .ok_or_else(|| RegistryError::Host("block height overflow".into()))?;
        tracing::debug!(height = *height, "advanced clock");
        Ok(*height)
    }

    /// Jump the clock to `target`. Logical time never goes backwards.
    pub async fn set_height(&self, target: LogicalTime) -> Result<()> {
        let mut height = self.height.lock().await;
        if target < *height {
            return Err(RegistryError::Host(format!(
                "block height cannot move from {} back to {}",
                *height, target
            )));
        }
        *height = target;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Run `register` for an authenticated `caller` at the current height.
    pub async fn register(
        &self,
        request: RegistrationRequest,
        caller: Principal,
    ) -> Result<Fingerprint> {
        self.run(move |registry, now| registry.register(request, &caller, now))
            .await
    }

    pub async fn verify(&self, fingerprint: Fingerprint) -> Result<ContentRecord> {
        self.run(move |registry, _| registry.verify(&fingerprint))
            .await
    }

    pub async fn get_entry_at(&self, author: Principal, index: u64) -> Result<Option<Fingerprint>> {
        self.run(move |registry, _| registry.get_entry_at(&author, index))
            .await
    }

    pub async fn get_stats(&self, author: Principal) -> Result<AuthorStats> {
        self.run(move |registry, _| registry.get_stats(&author))
            .await
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&ContentRegistry<S, V>, LogicalTime) -> Result<T> + Send + 'static,
    {
        let height = Arc::clone(&self.height).lock_owned().await;
        let registry = Arc::clone(&self.registry);

        tokio::task::spawn_blocking(move || {
            let outcome = op(&registry, *height);
            drop(height);
            outcome
        })
        .await
        .map_err(|e| RegistryError::Host(format!("registry task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegistryConfig;
    use provenance_core::{AcceptAllVerifier, ClaimSignature};
    use provenance_store::MemoryStore;

    fn host() -> LedgerHost<MemoryStore, AcceptAllVerifier> {
        let registry = ContentRegistry::new(MemoryStore::new(), RegistryConfig::default()).unwrap();
        LedgerHost::new(registry, 100)
    }

    fn request(byte: u8) -> RegistrationRequest {
        RegistrationRequest::builder(Fingerprint::from_bytes([byte; 32]), ClaimSignature::ZERO)
            .content_type("image")
            .title("photo")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_uses_block_height() {
        let host = host();
        let alice = Principal::new("alice").unwrap();

        let fp = host.register(request(1), alice.clone()).await.unwrap();
        host.advance(5).await.unwrap();
        host.register(request(2), alice.clone()).await.unwrap();

        assert_eq!(host.verify(fp).await.unwrap().timestamp, 100);
        let stats = host.get_stats(alice.clone()).await.unwrap();
        assert_eq!(stats.content_count, 2);
        assert_eq!(stats.last_activity, 105);
        assert_eq!(
            host.get_entry_at(alice, 1).await.unwrap(),
            Some(Fingerprint::from_bytes([2; 32]))
        );
    }

    #[tokio::test]
    async fn test_clock_never_regresses() {
        let host = host();
        host.set_height(200).await.unwrap();
        assert_eq!(host.height().await, 200);

        let err = host.set_height(150).await.unwrap_err();
        assert!(matches!(err, RegistryError::Host(_)));
        assert_eq!(host.height().await, 200);

        host.set_height(u64::MAX).await.unwrap();
        assert!(host.advance(1).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_missing_through_host() {
        let host = host();
        let err = host.verify(Fingerprint::from_bytes([9; 32])).await.unwrap_err();
        assert_eq!(err.code(), 102);
    }
}
