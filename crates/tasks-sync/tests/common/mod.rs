//! Shared fixtures for the save pipeline integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, Notify};

use tasks_core::record::{Project, Task, User, Watch};
use tasks_core::{Operation, RecordData, RecordId, RecordKind, StoreKey};
use tasks_store::{InMemoryStore, SyntheticProjects};
use tasks_sync::{CommitAck, CommitRequest, Remote, RemoteError, SyncConfig, TasksService};

// ---------------------------------------------------------------------------
// Scripted remote
// ---------------------------------------------------------------------------

/// In-process [`Remote`] that records every call and answers as scripted.
///
/// Creates are acknowledged with identities counting up from 42.
pub struct ScriptedRemote {
    next_id: AtomicI64,
    calls: StdMutex<Vec<CommitRequest>>,
    failing: StdMutex<HashSet<StoreKey>>,
    gate: Option<Arc<Notify>>,
    hang: bool,
    omit_ids: bool,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        ScriptedRemote {
            next_id: AtomicI64::new(42),
            calls: StdMutex::new(Vec::new()),
            failing: StdMutex::new(HashSet::new()),
            gate: None,
            hang: false,
            omit_ids: false,
        }
    }

    /// Rejects commits of these records.
    pub fn failing(self, keys: impl IntoIterator<Item = StoreKey>) -> Self {
        self.failing.lock().unwrap().extend(keys);
        self
    }

    /// Holds every commit until the gate is notified once for it.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Never answers.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Acknowledges creates without an identity.
    pub fn without_ids(mut self) -> Self {
        self.omit_ids = true;
        self
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Every commit request received, in order.
    pub fn calls(&self) -> Vec<CommitRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn committed_keys(&self) -> Vec<StoreKey> {
        self.calls().iter().map(|c| c.key).collect()
    }

    pub fn committed_kinds(&self) -> Vec<RecordKind> {
        self.calls().iter().map(|c| c.kind).collect()
    }

    /// Yields until at least `n` commits have reached the remote.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls.lock().unwrap().len() < n {
            tokio::task::yield_now().await;
        }
    }
}

impl Remote for ScriptedRemote {
    async fn commit(&self, request: CommitRequest) -> Result<CommitAck, RemoteError> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().contains(&request.key) {
            return Err(RemoteError::Rejected {
                status: 500,
                message: format!("scripted failure for {}", request.key),
            });
        }

        match request.operation {
            Operation::Create if self.omit_ids => Ok(CommitAck::done()),
            Operation::Create => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                Ok(CommitAck::created(RecordId(id)))
            }
            Operation::Update | Operation::Destroy => Ok(CommitAck::done()),
        }
    }
}

// ---------------------------------------------------------------------------
// Store and service helpers
// ---------------------------------------------------------------------------

pub type TestService = TasksService<InMemoryStore, ScriptedRemote>;

/// Routes pipeline logs to the test harness; `RUST_LOG` raises the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn service_with(
    store: InMemoryStore,
    synthetic: SyntheticProjects,
    remote: ScriptedRemote,
) -> TestService {
    init_tracing();
    TasksService::new(
        Arc::new(Mutex::new(store)),
        remote,
        synthetic,
        &SyncConfig::default(),
    )
    .unwrap()
}

pub fn user(login: &str) -> RecordData {
    RecordData::User(User {
        login_name: login.into(),
        role: Default::default(),
    })
}

pub fn project() -> RecordData {
    RecordData::Project(Project::default())
}

pub fn task(project_id: Option<RecordId>, assignee_id: Option<RecordId>) -> RecordData {
    RecordData::Task(Task {
        project_id,
        assignee_id,
        ..Task::default()
    })
}

pub fn watch(task_id: RecordId, user_id: RecordId) -> RecordData {
    RecordData::Watch(Watch { task_id, user_id })
}

/// Position of a kind in the commit order.
pub fn tier_rank(kind: RecordKind) -> usize {
    match kind {
        RecordKind::User => 0,
        RecordKind::Project => 1,
        RecordKind::Task => 2,
        RecordKind::Watch => 3,
    }
}
