//! Write batches: staged mutations applied as one atomic unit.

use std::fmt;

use provenance_core::{AuthorStats, ContentRecord, Fingerprint, Principal, VerifierEntry};

/// The tables a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Records,
    AuthorStats,
    AuthorIndex,
    Verifiers,
}

impl Table {
    /// SQL table name.
    pub const fn name(self) -> &'static str {
        match self {
            Table::Records => "content_records",
            Table::AuthorStats => "author_stats",
            Table::AuthorIndex => "author_index",
            Table::Verifiers => "verifiers",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Put-if-absent on the records table.
    InsertRecord {
        fingerprint: Fingerprint,
        record: ContentRecord,
    },
    /// Put-if-absent on the author index.
    InsertIndexEntry {
        author: Principal,
        seq: u64,
        fingerprint: Fingerprint,
    },
    /// Upsert on the author stats table.
    PutAuthorStats {
        author: Principal,
        stats: AuthorStats,
    },
    /// Upsert on the verifiers table.
    PutVerifier {
        verifier: Principal,
        entry: VerifierEntry,
    },
}

impl Mutation {
    pub fn table(&self) -> Table {
        match self {
            Mutation::InsertRecord { .. } => Table::Records,
            Mutation::InsertIndexEntry { .. } => Table::AuthorIndex,
            Mutation::PutAuthorStats { .. } => Table::AuthorStats,
            Mutation::PutVerifier { .. } => Table::Verifiers,
        }
    }

    /// Human-readable key, used in conflict errors and logs.
    pub fn key(&self) -> String {
        match self {
            Mutation::InsertRecord { fingerprint, .. } => fingerprint.to_hex(),
            Mutation::InsertIndexEntry { author, seq, .. } => format!("{}/{}", author, seq),
            Mutation::PutAuthorStats { author, .. } => author.to_string(),
            Mutation::PutVerifier { verifier, .. } => verifier.to_string(),
        }
    }
}

/// An ordered set of mutations committed together.
///
/// Nothing is visible until [`Store::commit`](crate::Store::commit) succeeds;
/// dropping a batch discards it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    mutations: Vec<Mutation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_record(&mut self, fingerprint: Fingerprint, record: ContentRecord) -> &mut Self {
        self.mutations.push(Mutation::InsertRecord { fingerprint, record });
        self
    }

    pub fn insert_index_entry(
        &mut self,
        author: Principal,
        seq: u64,
        fingerprint: Fingerprint,
    ) -> &mut Self {
        self.mutations.push(Mutation::InsertIndexEntry {
            author,
            seq,
            fingerprint,
        });
        self
    }

    pub fn put_author_stats(&mut self, author: Principal, stats: AuthorStats) -> &mut Self {
        self.mutations.push(Mutation::PutAuthorStats { author, stats });
        self
    }

    pub fn put_verifier(&mut self, verifier: Principal, entry: VerifierEntry) -> &mut Self {
        self.mutations.push(Mutation::PutVerifier { verifier, entry });
        self
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
