//! Dirty-set classification.
//!
//! Scans the store's change log once and partitions the records that still
//! need persisting into one queue per kind. The change log is only a list of
//! candidates: every entry's status is re-read here, because a record can be
//! touched several times and settle back to clean before a save runs.

use std::collections::VecDeque;

use indexmap::IndexSet;

use tasks_core::{Operation, RecordKind, StoreKey};

use crate::traits::RecordStore;
use crate::types::SyntheticProjects;

/// Per-kind queues of dirty records, each in change-log order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyQueues {
    queues: [VecDeque<StoreKey>; 4],
}

impl DirtyQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue for one kind.
    pub fn queue(&self, kind: RecordKind) -> &VecDeque<StoreKey> {
        &self.queues[kind.index()]
    }

    pub fn queue_mut(&mut self, kind: RecordKind) -> &mut VecDeque<StoreKey> {
        &mut self.queues[kind.index()]
    }

    /// True if no kind has a dirty record.
    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    /// Total number of queued records across all kinds.
    pub fn total(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    pub fn clear(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
    }
}

/// Builds the per-kind dirty queues from the store's change log.
///
/// A record is queued when it is still held, its current status is dirty,
/// and it is not one of the synthetic projects. A destroyed record that
/// still carries a temporary identity was never known to the server and is
/// dropped. Duplicate log entries are queued once, at their first position.
///
/// Must only run while no save session is in progress.
pub fn compute_dirty_queues<S>(store: &S, synthetic: &SyntheticProjects) -> DirtyQueues
where
    S: RecordStore + ?Sized,
{
    let candidates: IndexSet<StoreKey> = store.change_log().into_iter().collect();
    let mut queues = DirtyQueues::new();

    for key in candidates {
        if let Some(kind) = queueable_kind(store, synthetic, key) {
            queues.queue_mut(kind).push_back(key);
        }
    }

    queues
}

/// True when any record other than the synthetic projects awaits persisting.
pub fn has_dirty_records<S>(store: &S, synthetic: &SyntheticProjects) -> bool
where
    S: RecordStore + ?Sized,
{
    store
        .change_log()
        .into_iter()
        .any(|key| queueable_kind(store, synthetic, key).is_some())
}

/// The queue a logged key belongs in, or `None` if it needs no commit.
fn queueable_kind<S>(store: &S, synthetic: &SyntheticProjects, key: StoreKey) -> Option<RecordKind>
where
    S: RecordStore + ?Sized,
{
    if synthetic.contains(key) {
        return None;
    }
    let operation = store.status_of(key)?.pending_operation()?;
    if operation == Operation::Destroy && store.identity_of(key)?.is_temporary() {
        return None;
    }
    store.kind_of(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use tasks_core::record::{Project, Task, User, Watch};
    use tasks_core::{Record, RecordData, RecordId, RecordStatus};

    fn user(login: &str) -> RecordData {
        RecordData::User(User {
            login_name: login.into(),
            role: Default::default(),
        })
    }

    fn project() -> RecordData {
        RecordData::Project(Project::default())
    }

    #[test]
    fn clean_store_has_no_dirty_records() {
        let (store, synthetic) = InMemoryStore::with_synthetic_projects();
        let queues = compute_dirty_queues(&store, &synthetic);
        assert!(queues.is_empty());
        assert_eq!(queues.total(), 0);
        assert!(!has_dirty_records(&store, &synthetic));
    }

    #[test]
    fn synthetic_projects_are_never_queued() {
        let (mut store, synthetic) = InMemoryStore::with_synthetic_projects();
        store
            .update_record(synthetic.all_tasks, |r| r.description = Some("x".into()))
            .unwrap();
        store
            .set_status(synthetic.unallocated_tasks, RecordStatus::Modified)
            .unwrap();
        let real = store.create_named("Tasks 1.0", project());

        let queues = compute_dirty_queues(&store, &synthetic);
        assert_eq!(queues.queue(RecordKind::Project), &VecDeque::from([real]));
    }

    #[test]
    fn records_are_partitioned_by_kind_in_log_order() {
        let (mut store, synthetic) = InMemoryStore::with_synthetic_projects();
        let t1 = store.create_record(RecordData::Task(Task::default()));
        let u1 = store.create_record(user("a"));
        let w1 = store.create_record(RecordData::Watch(Watch {
            task_id: RecordId(-3),
            user_id: RecordId(-4),
        }));
        let u2 = store.create_record(user("b"));
        let p1 = store.create_record(project());

        let queues = compute_dirty_queues(&store, &synthetic);
        assert_eq!(queues.queue(RecordKind::User), &VecDeque::from([u1, u2]));
        assert_eq!(queues.queue(RecordKind::Project), &VecDeque::from([p1]));
        assert_eq!(queues.queue(RecordKind::Task), &VecDeque::from([t1]));
        assert_eq!(queues.queue(RecordKind::Watch), &VecDeque::from([w1]));
        assert_eq!(queues.total(), 5);
    }

    #[test]
    fn repeated_log_entries_are_queued_once_at_first_position() {
        let (mut store, synthetic) = InMemoryStore::with_synthetic_projects();
        let a = store.create_record(user("a"));
        let b = store.create_record(user("b"));
        store.update_record(a, |r| r.name = Some("A".into())).unwrap();
        store.update_record(b, |r| r.name = Some("B".into())).unwrap();
        store.update_record(a, |r| r.name = Some("AA".into())).unwrap();

        let queues = compute_dirty_queues(&store, &synthetic);
        assert_eq!(queues.queue(RecordKind::User), &VecDeque::from([a, b]));
    }

    #[test]
    fn status_is_reread_rather_than_trusted() {
        let (mut store, synthetic) = InMemoryStore::with_synthetic_projects();
        let settled = store
            .load_record(Record::new(RecordId(9), user("settled")))
            .unwrap();
        store.update_record(settled, |_| {}).unwrap();
        store.set_status(settled, RecordStatus::Clean).unwrap();
        let gone = store.create_record(user("gone"));
        store.destroy_record(gone).unwrap();

        assert!(compute_dirty_queues(&store, &synthetic).is_empty());
        assert!(!has_dirty_records(&store, &synthetic));
    }

    #[test]
    fn destroyed_saved_records_are_queued() {
        let (mut store, synthetic) = InMemoryStore::with_synthetic_projects();
        let key = store
            .load_record(Record::new(RecordId(12), project()))
            .unwrap();
        store.destroy_record(key).unwrap();

        let queues = compute_dirty_queues(&store, &synthetic);
        assert_eq!(queues.queue(RecordKind::Project), &VecDeque::from([key]));
    }

    #[test]
    fn destroyed_temporary_records_are_dropped() {
        // A store may keep a locally deleted record around; the classifier
        // still never sends a destroy for an identity the server never saw.
        let (mut store, synthetic) = InMemoryStore::with_synthetic_projects();
        let key = store.create_record(user("ephemeral"));
        store.set_status(key, RecordStatus::Destroyed).unwrap();

        assert!(compute_dirty_queues(&store, &synthetic).is_empty());
        assert!(!has_dirty_records(&store, &synthetic));
    }

    #[test]
    fn failed_records_are_retried() {
        let (mut store, synthetic) = InMemoryStore::with_synthetic_projects();
        let key = store.create_record(user("retry"));
        store
            .set_status(key, RecordStatus::Error(Operation::Create))
            .unwrap();

        let queues = compute_dirty_queues(&store, &synthetic);
        assert_eq!(queues.queue(RecordKind::User), &VecDeque::from([key]));
        assert!(has_dirty_records(&store, &synthetic));
    }

    #[test]
    fn clear_empties_every_queue() {
        let (mut store, synthetic) = InMemoryStore::with_synthetic_projects();
        store.create_record(user("a"));
        store.create_record(project());
        let mut queues = compute_dirty_queues(&store, &synthetic);
        assert_eq!(queues.total(), 2);
        queues.clear();
        assert!(queues.is_empty());
    }
}
