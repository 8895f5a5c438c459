//! The per-author paginated index.
//!
//! Each author's fingerprints are numbered from 0 in registration order.
//! Positions are assigned once and never reused, so `0..content_count` is
//! always fully populated.

use std::sync::Arc;

use provenance_core::{AuthorStats, Fingerprint, LogicalTime, Principal};
use provenance_store::{Store, StoreError, StoreExt, WriteBatch};

use crate::error::Result;

/// Read access to author stats and the `(author, seq)` index.
pub struct AuthorIndex<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for AuthorIndex<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> AuthorIndex<S> {
    pub(crate) fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fingerprint at position `index` of `author`'s index.
    ///
    /// `None` when `index >= content_count`; paging past the end is not an
    /// error.
    pub fn get_entry_at(&self, author: &Principal, index: u64) -> Result<Option<Fingerprint>> {
        let stats = self.get_stats(author)?;
        if index >= stats.content_count {
            return Ok(None);
        }
        Ok(self.store.get_index_entry(author, index)?)
    }

    /// Stats for `author`; zero count and zero activity if never seen.
    pub fn get_stats(&self, author: &Principal) -> Result<AuthorStats> {
        Ok(self.store.stats_or_default(author)?)
    }

    /// Up to `limit` fingerprints starting at position `start`.
    ///
    /// The page ends early at `content_count`. A missing entry below the
    /// count means the store is corrupt and is reported as
    /// [`StoreError::InvalidData`].
    pub fn page(&self, author: &Principal, start: u64, limit: u64) -> Result<Vec<Fingerprint>> {
        let stats = self.get_stats(author)?;
        let end = start.saturating_add(limit).min(stats.content_count);

        let mut page = Vec::new();
        for seq in start..end {
            let fingerprint = self.store.get_index_entry(author, seq)?.ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "author index for {} has no entry at {} (count {})",
                    author, seq, stats.content_count
                ))
            })?;
            page.push(fingerprint);
        }
        Ok(page)
    }

    /// Stage the index entry and stats upsert for a new registration.
    ///
    /// Returns the sequence number the fingerprint will occupy.
    pub(crate) fn stage_append(
        batch: &mut WriteBatch,
        author: &Principal,
        stats: AuthorStats,
        fingerprint: Fingerprint,
        now: LogicalTime,
    ) -> u64 {
        let seq = stats.content_count;
        batch
            .insert_index_entry(author.clone(), seq, fingerprint)
            .put_author_stats(author.clone(), stats.advanced(now));
        seq
    }
}
