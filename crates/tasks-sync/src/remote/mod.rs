//! The remote side of a commit.
//!
//! [`Remote`] is the one seam between the save pipeline and wherever records
//! end up: [`HttpRemote`] talks to the tasks server, [`LocalRemote`] writes to
//! the offline SQLite archive. Each commit is a single request whose outcome
//! the pipeline awaits before touching the next record.

pub mod http;
pub mod local;

pub use http::{resource_path, HttpRemote};
pub use local::LocalRemote;

use std::future::Future;

use serde::Serialize;

use tasks_core::{Operation, Record, RecordId, RecordKind, StoreKey};

use crate::error::RemoteError;

/// One record to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitRequest {
    pub key: StoreKey,
    pub kind: RecordKind,
    pub operation: Operation,
    /// Snapshot taken when the commit started.
    pub record: Record,
}

/// Successful outcome of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitAck {
    /// Permanent identity assigned by a create.
    pub id: Option<RecordId>,
}

impl CommitAck {
    pub fn created(id: RecordId) -> Self {
        CommitAck { id: Some(id) }
    }

    pub fn done() -> Self {
        CommitAck { id: None }
    }
}

/// Destination for committed records.
pub trait Remote {
    /// Issues the persist operation and resolves once its outcome is known.
    fn commit(
        &self,
        request: CommitRequest,
    ) -> impl Future<Output = Result<CommitAck, RemoteError>> + Send;
}
