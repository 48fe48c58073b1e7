//! Record commit state machine.
//!
//! Each dirty record goes `New | Modified | Destroyed | Error(op)` →
//! `Committing(op)` → one of:
//!
//! - `Clean` after a create (with its permanent identity) or an update,
//! - evicted after a destroy,
//! - `Error(op)` when the remote fails or times out.
//!
//! Only one record is in flight at a time. The store lock is released while
//! the remote call is outstanding so the rest of the client can keep using
//! the store. A record edited or deleted in that window is `Superseded` and
//! settles to `Modified` or `Destroyed` instead of `Clean`, leaving the
//! change for the next session.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use tasks_core::{Operation, RecordId, RecordKind, RecordStatus, StoreKey};
use tasks_store::{RecordStore, StoreError};

use crate::error::{RemoteError, SaveError};
use crate::relink::Relinker;
use crate::remote::{CommitAck, CommitRequest, Remote};
use crate::scheduler::TierScheduler;

/// What a successful save session persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// Committed records, in commit order.
    pub committed: Vec<CommittedRecord>,
    /// Foreign keys rewritten after creates.
    pub relinked: usize,
}

impl SaveReport {
    /// True when the session had nothing to persist.
    pub fn is_noop(&self) -> bool {
        self.committed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedRecord {
    pub key: StoreKey,
    pub kind: RecordKind,
    pub operation: Operation,
    pub previous_id: RecordId,
    pub id: RecordId,
}

/// Commits records one at a time against a shared store.
pub struct Committer<'a, S, R> {
    store: &'a Mutex<S>,
    remote: &'a R,
    relinker: &'a Relinker,
    timeout: Option<Duration>,
}

impl<'a, S, R> Committer<'a, S, R>
where
    S: RecordStore + Send,
    R: Remote + Sync,
{
    pub fn new(
        store: &'a Mutex<S>,
        remote: &'a R,
        relinker: &'a Relinker,
        timeout: Option<Duration>,
    ) -> Self {
        Committer {
            store,
            remote,
            relinker,
            timeout,
        }
    }

    /// Drains `kind`'s queue in order, stopping at the first failure.
    pub async fn commit_tier(
        &self,
        scheduler: &mut TierScheduler,
        kind: RecordKind,
        report: &mut SaveReport,
    ) -> Result<(), SaveError> {
        while let Some(key) = scheduler.head(kind) {
            if let Some((committed, relinked)) = self.commit_record(key, kind).await? {
                report.committed.push(committed);
                report.relinked += relinked;
            }
            scheduler.pop(kind);
        }
        Ok(())
    }

    /// Commits one record and returns what happened along with the number of
    /// relinked foreign keys.
    ///
    /// Returns `Ok(None)` when the record no longer needs persisting (it was
    /// evicted or settled back to clean since it was queued).
    pub async fn commit_record(
        &self,
        key: StoreKey,
        kind: RecordKind,
    ) -> Result<Option<(CommittedRecord, usize)>, SaveError> {
        let request = {
            let mut store = self.store.lock().await;
            let Some((status, operation)) = store
                .status_of(key)
                .and_then(|s| Some((s, s.pending_operation()?)))
            else {
                warn!(%key, %kind, "queued record no longer dirty, skipping");
                return Ok(None);
            };
            // A superseded record left by a cancelled session keeps its follow-up.
            if !matches!(status, RecordStatus::Superseded { .. }) {
                store.set_status(key, RecordStatus::Committing(operation))?;
            }
            CommitRequest {
                key,
                kind,
                operation,
                record: store.materialize(key)?,
            }
        };
        let operation = request.operation;
        let previous_id = request.record.id;
        debug!(%key, %kind, %operation, id = %previous_id, "committing record");

        let outcome = self
            .send(request)
            .await
            .and_then(|ack| acknowledged_identity(operation, previous_id, ack));

        let mut store = self.store.lock().await;
        let id = match outcome {
            Ok(id) => id,
            Err(source) => {
                mark_failed(&mut *store, key, operation)?;
                warn!(%key, %kind, %operation, error = %source, "commit failed");
                return Err(SaveError::CommitFailed {
                    kind,
                    key,
                    operation,
                    source,
                });
            }
        };

        match self.settle(&mut *store, key, kind, operation, id) {
            Ok(relinked) => {
                debug!(%key, %kind, %operation, %id, relinked, "record committed");
                let committed = CommittedRecord {
                    key,
                    kind,
                    operation,
                    previous_id,
                    id,
                };
                Ok(Some((committed, relinked)))
            }
            Err(err) => {
                // The remote has the change but the store could not take it.
                mark_failed(&mut *store, key, operation)?;
                Err(err.into())
            }
        }
    }

    async fn send(&self, request: CommitRequest) -> Result<CommitAck, RemoteError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.remote.commit(request))
                .await
                .unwrap_or(Err(RemoteError::Timeout(limit))),
            None => self.remote.commit(request).await,
        }
    }

    /// Applies a successful commit to the store.
    fn settle(
        &self,
        store: &mut S,
        key: StoreKey,
        kind: RecordKind,
        operation: Operation,
        id: RecordId,
    ) -> Result<usize, StoreError> {
        let settled = store
            .status_of(key)
            .ok_or(StoreError::RecordNotFound(key))?
            .after_commit();
        if settled.is_dirty() {
            debug!(%key, %kind, status = ?settled, "record changed while committing");
        }
        match operation {
            Operation::Create => {
                let previous = store.assign_identity(key, id)?;
                store.set_status(key, settled)?;
                self.relinker.relink(store, kind, previous, id)
            }
            Operation::Update => {
                store.set_status(key, settled)?;
                Ok(0)
            }
            Operation::Destroy => {
                store.evict(key)?;
                Ok(0)
            }
        }
    }
}

/// Records a failed commit on a record that is still held.
///
/// A record still in flight keeps any change made meanwhile; one already
/// settled goes back to retrying `operation`.
fn mark_failed<S>(store: &mut S, key: StoreKey, operation: Operation) -> Result<(), StoreError>
where
    S: RecordStore + ?Sized,
{
    let Some(status) = store.status_of(key) else {
        return Ok(());
    };
    if !status.is_in_flight() {
        return store.set_status(key, RecordStatus::Error(operation));
    }
    match status.after_failure() {
        Some(status) => store.set_status(key, status),
        None => store.evict(key),
    }
}

/// The identity a record holds once `ack` has been applied.
///
/// A create must come back with a fresh permanent identity; updates and
/// destroys keep the one they were sent with.
fn acknowledged_identity(
    operation: Operation,
    sent: RecordId,
    ack: CommitAck,
) -> Result<RecordId, RemoteError> {
    match operation {
        Operation::Create => {
            let id = ack.id.ok_or(RemoteError::MissingIdentity)?;
            if id.is_permanent() {
                Ok(id)
            } else {
                Err(RemoteError::InvalidIdentity(id))
            }
        }
        Operation::Update | Operation::Destroy => Ok(sent),
    }
}
