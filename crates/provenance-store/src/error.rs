//! Error types for the store module.

use thiserror::Error;

use crate::batch::Table;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A put-if-absent mutation hit an existing key. The batch was not applied.
    #[error("conflict in {table}: key {key} already exists")]
    Conflict { table: Table, key: String },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

impl From<provenance_core::CoreError> for StoreError {
    fn from(e: provenance_core::CoreError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
