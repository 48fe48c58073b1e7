//! [`Remote`] over the offline SQLite archive.

use tokio::sync::Mutex;

use tasks_core::Operation;
use tasks_store::SqliteArchive;

use super::{CommitAck, CommitRequest, Remote};
use crate::error::RemoteError;

/// Persists commits into a local [`SqliteArchive`].
///
/// The archive connection is `!Sync`, so it sits behind an async mutex the
/// same way the store does.
pub struct LocalRemote {
    archive: Mutex<SqliteArchive>,
}

impl LocalRemote {
    pub fn new(archive: SqliteArchive) -> Self {
        LocalRemote {
            archive: Mutex::new(archive),
        }
    }

    pub fn archive(&self) -> &Mutex<SqliteArchive> {
        &self.archive
    }

    pub fn into_archive(self) -> SqliteArchive {
        self.archive.into_inner()
    }
}

impl Remote for LocalRemote {
    async fn commit(&self, request: CommitRequest) -> Result<CommitAck, RemoteError> {
        let mut archive = self.archive.lock().await;
        match request.operation {
            Operation::Create => {
                let id = archive.insert(&request.record)?;
                Ok(CommitAck::created(id))
            }
            Operation::Update => {
                archive.update(&request.record)?;
                Ok(CommitAck::done())
            }
            Operation::Destroy => {
                archive.delete(request.kind, request.record.id)?;
                Ok(CommitAck::done())
            }
        }
    }
}
