//! # Provenance Store
//!
//! Storage abstraction for the provenance registry. Provides a trait-based
//! interface over four keyed tables with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The registry's state lives in four exact-match tables:
//!
//! | Table | Key | Value |
//! |---|---|---|
//! | records | fingerprint | [`ContentRecord`](provenance_core::ContentRecord) |
//! | author stats | author | [`AuthorStats`](provenance_core::AuthorStats) |
//! | author index | (author, seq) | fingerprint |
//! | verifiers | verifier | [`VerifierEntry`](provenance_core::VerifierEntry) |
//!
//! Reads go straight to the [`Store`]. Writes are staged in a [`WriteBatch`]
//! and applied by [`Store::commit`], which applies every mutation or none.
//!
//! ## Key Types
//!
//! - [`Store`] - The trait for all storage operations
//! - [`WriteBatch`] - A unit of work: staged mutations committed together
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`StateDump`] - Ordered snapshot of every table
//!
//! ## Usage
//!
//! ```rust,no_run
//! use provenance_store::{SqliteStore, Store, WriteBatch};
//!
//! // Open a SQLite database
//! let store = SqliteStore::open("registry.db").unwrap();
//!
//! // Or use an in-memory database for testing
//! let store = SqliteStore::open_memory().unwrap();
//!
//! // let mut batch = WriteBatch::new();
//! // batch.insert_record(fingerprint, record);
//! // store.commit(batch).unwrap();
//! ```
//!
//! ## Design Notes
//!
//! - **Put-if-absent**: record and index inserts fail the whole batch with
//!   [`StoreError::Conflict`] if the key exists
//! - **Upserts**: author stats and verifier entries overwrite
//! - **No deletes**: nothing in this crate removes a key

pub mod batch;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use batch::{Mutation, Table, WriteBatch};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{StateDump, Store, StoreExt};
