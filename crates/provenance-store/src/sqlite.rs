//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the registry. It uses rusqlite
//! with bundled SQLite; each [`WriteBatch`] runs inside one SQLite
//! transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use provenance_core::{
    decode_record, encode_record, AuthorStats, ContentRecord, Fingerprint, Principal,
    VerifierEntry,
};

use crate::batch::{Mutation, WriteBatch};
use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{StateDump, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    /// Execute an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute an operation that needs mutable access.
    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }
}

/// SQLite integers are signed; u64 columns are stored by bit pattern so the
/// full range survives a round trip.
fn to_sql_int(n: u64) -> i64 {
    n as i64
}

fn from_sql_int(n: i64) -> u64 {
    n as u64
}

fn stats_from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<AuthorStats> {
    Ok(AuthorStats {
        content_count: from_sql_int(row.get(offset)?),
        last_activity: from_sql_int(row.get(offset + 1)?),
    })
}

fn fingerprint_from_blob(bytes: Vec<u8>) -> Result<Fingerprint> {
    Ok(Fingerprint::try_from(bytes.as_slice())?)
}

/// Apply one mutation inside an open transaction.
///
/// Put-if-absent inserts use `INSERT OR IGNORE` and treat zero affected rows
/// as a conflict.
fn apply_mutation(tx: &Transaction<'_>, mutation: &Mutation) -> Result<()> {
    let affected = match mutation {
        Mutation::InsertRecord {
            fingerprint,
            record,
        } => tx.execute(
            "INSERT OR IGNORE INTO content_records (fingerprint, author, timestamp, record)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fingerprint.as_bytes().as_slice(),
                record.author.as_str(),
                to_sql_int(record.timestamp),
                encode_record(record),
            ],
        )?,
        Mutation::InsertIndexEntry {
            author,
            seq,
            fingerprint,
        } => tx.execute(
            "INSERT OR IGNORE INTO author_index (author, seq, fingerprint) VALUES (?1, ?2, ?3)",
            params![author.as_str(), to_sql_int(*seq), fingerprint.as_bytes().as_slice()],
        )?,
        Mutation::PutAuthorStats { author, stats } => tx.execute(
            "INSERT INTO author_stats (author, content_count, last_activity) VALUES (?1, ?2, ?3)
             ON CONFLICT(author) DO UPDATE SET
                content_count = excluded.content_count,
                last_activity = excluded.last_activity",
            params![
                author.as_str(),
                to_sql_int(stats.content_count),
                to_sql_int(stats.last_activity)
            ],
        )?,
        Mutation::PutVerifier { verifier, entry } => tx.execute(
            "INSERT INTO verifiers (verifier, active) VALUES (?1, ?2)
             ON CONFLICT(verifier) DO UPDATE SET active = excluded.active",
            params![verifier.as_str(), entry.active],
        )?,
    };

    if affected == 0 {
        return Err(StoreError::Conflict {
            table: mutation.table(),
            key: mutation.key(),
        });
    }
    Ok(())
}

impl Store for SqliteStore {
    fn get_record(&self, fingerprint: &Fingerprint) -> Result<Option<ContentRecord>> {
        let blob: Option<Vec<u8>> = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT record FROM content_records WHERE fingerprint = ?1",
                    params![fingerprint.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?)
        })?;

        blob.map(|b| decode_record(&b).map_err(StoreError::from))
            .transpose()
    }

    fn has_record(&self, fingerprint: &Fingerprint) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM content_records WHERE fingerprint = ?1)",
                params![fingerprint.as_bytes().as_slice()],
                |row| row.get(0),
            )?)
        })
    }

    fn get_author_stats(&self, author: &Principal) -> Result<Option<AuthorStats>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT content_count, last_activity FROM author_stats WHERE author = ?1",
                    params![author.as_str()],
                    |row| stats_from_row(row, 0),
                )
                .optional()?)
        })
    }

    fn get_index_entry(&self, author: &Principal, seq: u64) -> Result<Option<Fingerprint>> {
        let blob: Option<Vec<u8>> = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT fingerprint FROM author_index WHERE author = ?1 AND seq = ?2",
                    params![author.as_str(), to_sql_int(seq)],
                    |row| row.get(0),
                )
                .optional()?)
        })?;

        blob.map(fingerprint_from_blob).transpose()
    }

    fn get_verifier(&self, verifier: &Principal) -> Result<Option<VerifierEntry>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT active FROM verifiers WHERE verifier = ?1",
                    params![verifier.as_str()],
                    |row| Ok(VerifierEntry { active: row.get(0)? }),
                )
                .optional()?)
        })
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            for mutation in batch.mutations() {
                if let Err(e) = apply_mutation(&tx, mutation) {
                    // Dropping `tx` rolls the transaction back.
                    tracing::warn!(error = %e, "rejected write batch");
                    return Err(e);
                }
            }

            tx.commit()?;
            tracing::debug!(mutations = batch.len(), "committed write batch");
            Ok(())
        })
    }

    fn dump(&self) -> Result<StateDump> {
        self.with_conn(|conn| {
            let mut dump = StateDump::default();

            let mut stmt = conn.prepare("SELECT fingerprint, record FROM content_records")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (fp, record) in rows {
                dump.records
                    .insert(fingerprint_from_blob(fp)?, decode_record(&record)?);
            }

            let mut stmt =
                conn.prepare("SELECT author, content_count, last_activity FROM author_stats")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, stats_from_row(row, 1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (author, stats) in rows {
                dump.author_stats.insert(Principal::new(author)?, stats);
            }

            let mut stmt = conn.prepare("SELECT author, seq, fingerprint FROM author_index")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        from_sql_int(row.get(1)?),
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (author, seq, fp) in rows {
                dump.author_index
                    .insert((Principal::new(author)?, seq), fingerprint_from_blob(fp)?);
            }

            let mut stmt = conn.prepare("SELECT verifier, active FROM verifiers")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (verifier, active) in rows {
                dump.verifiers
                    .insert(Principal::new(verifier)?, VerifierEntry { active });
            }

            Ok(dump)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Table;
    use crate::memory::MemoryStore;
    use provenance_core::{ClaimSignature, RegistrationRequest};

    fn make_record(author: &Principal, fp: Fingerprint, url: Option<&str>) -> ContentRecord {
        let mut builder = RegistrationRequest::builder(fp, ClaimSignature::from_bytes([3; 65]))
            .content_type("article")
            .title("Hello World");
        if let Some(url) = url {
            builder = builder.storage_url(url);
        }
        ContentRecord::claim(&builder.build().unwrap(), author.clone(), 77)
    }

    fn registration_batch(author: &Principal, seq: u64, fp: Fingerprint) -> WriteBatch {
        let mut batch = WriteBatch::new();
        batch
            .insert_record(fp, make_record(author, fp, Some("ipfs://x")))
            .insert_index_entry(author.clone(), seq, fp)
            .put_author_stats(
                author.clone(),
                AuthorStats {
                    content_count: seq + 1,
                    last_activity: 77,
                },
            );
        batch
    }

    #[test]
    fn test_insert_and_get_record() {
        let store = SqliteStore::open_memory().unwrap();
        let alice = Principal::new("alice").unwrap();
        let fp = Fingerprint::from_bytes([0xaa; 32]);

        store.commit(registration_batch(&alice, 0, fp)).unwrap();

        let record = store.get_record(&fp).unwrap().unwrap();
        assert_eq!(record, make_record(&alice, fp, Some("ipfs://x")));
        assert!(store.has_record(&fp).unwrap());
        assert!(!store.has_record(&Fingerprint::from_bytes([0xbb; 32])).unwrap());
        assert_eq!(store.get_index_entry(&alice, 0).unwrap(), Some(fp));
        assert_eq!(
            store.get_author_stats(&alice).unwrap(),
            Some(AuthorStats {
                content_count: 1,
                last_activity: 77
            })
        );
    }

    #[test]
    fn test_conflict_rolls_back_whole_batch() {
        let store = SqliteStore::open_memory().unwrap();
        let alice = Principal::new("alice").unwrap();
        let fp = Fingerprint::from_bytes([0xaa; 32]);
        store.commit(registration_batch(&alice, 0, fp)).unwrap();
        let before = store.dump().unwrap().canonical_bytes();

        // New index slot and stats, but the record key already exists.
        let mut batch = WriteBatch::new();
        batch
            .insert_index_entry(alice.clone(), 1, fp)
            .put_author_stats(alice.clone(), AuthorStats::default().advanced(99))
            .insert_record(fp, make_record(&alice, fp, None));

        let err = store.commit(batch).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { table: Table::Records, .. }));
        assert_eq!(store.dump().unwrap().canonical_bytes(), before);
        assert_eq!(store.get_index_entry(&alice, 1).unwrap(), None);
    }

    #[test]
    fn test_matches_memory_store_dump() {
        let sqlite = SqliteStore::open_memory().unwrap();
        let memory = MemoryStore::new();
        let alice = Principal::new("alice").unwrap();
        let bob = Principal::new("bob").unwrap();

        for (author, seq, byte) in [(&alice, 0, 1u8), (&bob, 0, 2), (&alice, 1, 3)] {
            let fp = Fingerprint::from_bytes([byte; 32]);
            sqlite.commit(registration_batch(author, seq, fp)).unwrap();
            memory.commit(registration_batch(author, seq, fp)).unwrap();
        }

        let mut batch = WriteBatch::new();
        batch.put_verifier(bob.clone(), VerifierEntry { active: true });
        sqlite.commit(batch.clone()).unwrap();
        memory.commit(batch).unwrap();

        assert_eq!(
            sqlite.dump().unwrap().canonical_bytes(),
            memory.dump().unwrap().canonical_bytes()
        );
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");
        let alice = Principal::new("alice").unwrap();
        let fp = Fingerprint::from_bytes([0x11; 32]);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.commit(registration_batch(&alice, 0, fp)).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.has_record(&fp).unwrap());
        assert_eq!(reopened.get_index_entry(&alice, 0).unwrap(), Some(fp));
    }

    #[test]
    fn test_verifier_upsert() {
        let store = SqliteStore::open_memory().unwrap();
        let v = Principal::new("verifier-1").unwrap();
        assert_eq!(store.get_verifier(&v).unwrap(), None);

        for active in [true, false] {
            let mut batch = WriteBatch::new();
            batch.put_verifier(v.clone(), VerifierEntry { active });
            store.commit(batch).unwrap();
        }

        assert_eq!(store.get_verifier(&v).unwrap(), Some(VerifierEntry { active: false }));
    }

    #[test]
    fn test_full_u64_range_round_trips() {
        let store = SqliteStore::open_memory().unwrap();
        let alice = Principal::new("alice").unwrap();
        let fp = Fingerprint::from_bytes([0xee; 32]);
        let stats = AuthorStats {
            content_count: 1,
            last_activity: u64::MAX,
        };

        let mut batch = WriteBatch::new();
        batch
            .insert_index_entry(alice.clone(), u64::MAX - 1, fp)
            .put_author_stats(alice.clone(), stats);
        store.commit(batch).unwrap();

        assert_eq!(store.get_author_stats(&alice).unwrap(), Some(stats));
        assert_eq!(store.get_index_entry(&alice, u64::MAX - 1).unwrap(), Some(fp));
        assert_eq!(store.dump().unwrap().index_of(&alice), vec![(u64::MAX - 1, fp)]);
    }
}
