//! Storage error types for tasks-store.
//!
//! [`StoreError`] covers lookups of missing records, lifecycle violations,
//! and failures of the SQLite-backed archive.

use thiserror::Error;

use tasks_core::{CoreError, RecordId, RecordKind, StoreKey};

/// Errors produced by store and archive operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record is held under the given store key.
    #[error("record not found: key={0}")]
    RecordNotFound(StoreKey),

    /// No record carries the given identity.
    #[error("identity not found: id={0}")]
    IdentityNotFound(RecordId),

    /// A record was of a different kind than the caller required.
    #[error("wrong kind for id={id}: expected {expected}, found {found}")]
    WrongKind {
        id: RecordId,
        expected: RecordKind,
        found: RecordKind,
    },

    /// A permanent identity was about to be replaced.
    #[error("record key={key} already holds permanent id={id}")]
    IdentityAlreadyPermanent { key: StoreKey, id: RecordId },

    /// Another record already carries this identity.
    #[error("identity {id} already used by key={key}")]
    IdentityInUse { key: StoreKey, id: RecordId },

    /// An identity was offered that the server could not have assigned.
    #[error("identity {0} is not a permanent identity")]
    NotPermanent(RecordId),

    /// A locally created record was seeded with a non-temporary identity.
    #[error("identity {0} is not a temporary identity")]
    NotTemporary(RecordId),

    /// A foreign key points at a record the archive does not hold.
    #[error("dangling reference: {field}={id} has no {target} record")]
    DanglingReference {
        field: &'static str,
        id: RecordId,
        target: RecordKind,
    },

    /// A record-model rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),
}
