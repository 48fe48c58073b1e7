//! Error types for the save pipeline.
//!
//! [`RemoteError`] describes why a single commit failed; [`SaveError`] is
//! what a save session resolves to when it does not succeed.

use std::time::Duration;

use thiserror::Error;

use tasks_core::{Operation, RecordId, RecordKind, StoreKey};
use tasks_store::StoreError;

/// Failure of one remote persist operation.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No outcome arrived within the configured commit timeout.
    #[error("commit timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A create was acknowledged without a permanent identity.
    #[error("server acknowledged a create without an identity")]
    MissingIdentity,

    /// A create was acknowledged with an identity outside the server's space.
    #[error("server assigned invalid identity {0}")]
    InvalidIdentity(RecordId),

    /// The offline archive refused the operation.
    #[error("archive error: {0}")]
    Archive(#[from] StoreError),
}

/// Outcome of a failed save session.
#[derive(Debug, Error)]
pub enum SaveError {
    /// A session is already running; the request was refused untouched.
    #[error("save already in progress")]
    SaveInProgress,

    /// A record's commit failed and the session was aborted.
    #[error("failed to {operation} {kind} record (key={key}): {source}")]
    CommitFailed {
        kind: RecordKind,
        key: StoreKey,
        operation: Operation,
        #[source]
        source: RemoteError,
    },

    /// The local store rejected a pipeline step.
    #[error("store error during save: {0}")]
    Store(#[from] StoreError),
}

impl SaveError {
    /// The kind of record whose commit failed, if that is what happened.
    pub fn failed_kind(&self) -> Option<RecordKind> {
        match self {
            SaveError::CommitFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
