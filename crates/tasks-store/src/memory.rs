//! In-memory implementation of [`RecordStore`].
//!
//! [`InMemoryStore`] is the client's working set: every record the UI shows
//! lives here, edits mark records dirty and append to the change log, and the
//! save pipeline drains the dirty records to the server.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexSet;

use tasks_core::record::Project;
use tasks_core::{
    ForeignKey, Record, RecordData, RecordId, RecordKind, RecordStatus, StoreKey, TemporaryIds,
};

use crate::error::StoreError;
use crate::traits::RecordStore;
use crate::types::SyntheticProjects;

/// A record together with its lifecycle status.
#[derive(Debug, Clone)]
struct StoredRecord {
    record: Record,
    status: RecordStatus,
}

/// In-memory implementation of [`RecordStore`].
#[derive(Debug)]
pub struct InMemoryStore {
    /// Records in key order, so derived views come out deterministic.
    records: BTreeMap<StoreKey, StoredRecord>,
    identities: HashMap<RecordId, StoreKey>,
    change_log: Vec<StoreKey>,
    next_key: u32,
    temporary_ids: TemporaryIds,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        InMemoryStore {
            records: BTreeMap::new(),
            identities: HashMap::new(),
            change_log: Vec::new(),
            next_key: 1,
            temporary_ids: TemporaryIds::new(),
        }
    }

    /// Creates a store seeded with the "All Tasks" and "Unallocated Tasks"
    /// aggregation projects.
    ///
    /// Both are created like any other local project (new, temporary id,
    /// logged), which is exactly why the save pipeline must filter them out.
    pub fn with_synthetic_projects() -> (Self, SyntheticProjects) {
        let mut store = Self::new();
        let all_tasks = store.create_named(
            SyntheticProjects::ALL_TASKS_NAME,
            RecordData::Project(Project::default()),
        );
        let unallocated_tasks = store.create_named(
            SyntheticProjects::UNALLOCATED_TASKS_NAME,
            RecordData::Project(Project::default()),
        );
        (
            store,
            SyntheticProjects {
                all_tasks,
                unallocated_tasks,
            },
        )
    }

    // -------------------------------------------------------------------
    // Application-facing API
    // -------------------------------------------------------------------

    /// Creates a new local record with the next temporary identity.
    pub fn create_record(&mut self, data: RecordData) -> StoreKey {
        let id = self.temporary_ids.allocate();
        self.insert(Record::new(id, data), RecordStatus::New)
    }

    /// Creates a new local record with a one-line summary.
    pub fn create_named(&mut self, name: impl Into<String>, data: RecordData) -> StoreKey {
        let id = self.temporary_ids.allocate();
        self.insert(Record::new(id, data).named(name), RecordStatus::New)
    }

    /// Creates a new local record that already carries a temporary identity.
    ///
    /// Later allocations continue below the seeded identity.
    pub fn create_record_with_id(&mut self, record: Record) -> Result<StoreKey, StoreError> {
        if !record.id.is_temporary() {
            return Err(StoreError::NotTemporary(record.id));
        }
        self.ensure_unused(record.id)?;
        self.temporary_ids.reserve(record.id);
        Ok(self.insert(record, RecordStatus::New))
    }

    /// Adds a record fetched from the server. It starts clean.
    pub fn load_record(&mut self, record: Record) -> Result<StoreKey, StoreError> {
        if !record.id.is_permanent() {
            return Err(StoreError::NotPermanent(record.id));
        }
        self.ensure_unused(record.id)?;
        Ok(self.insert(record, RecordStatus::Clean))
    }

    /// Applies a local edit to a record.
    ///
    /// The identity attribute cannot be edited; only the server assigns it.
    pub fn update_record<F>(&mut self, key: StoreKey, edit: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Record),
    {
        let stored = self.stored_mut(key)?;
        let id = stored.record.id;
        edit(&mut stored.record);
        stored.record.id = id;
        stored.status = stored.status.after_edit();
        self.change_log.push(key);
        Ok(())
    }

    /// Deletes a record locally.
    ///
    /// A record the server has never seen is dropped on the spot; anything
    /// else is marked destroyed so the next save informs the server. A
    /// record whose create is in flight is kept until the create settles and
    /// then destroyed under its permanent identity.
    pub fn destroy_record(&mut self, key: StoreKey) -> Result<(), StoreError> {
        let stored = self.stored_mut(key)?;
        if stored.record.id.is_temporary() && !stored.status.is_in_flight() {
            return self.evict(key);
        }
        stored.status = stored.status.after_destroy();
        self.change_log.push(key);
        Ok(())
    }

    /// Finds a user by login name.
    pub fn find_user(&self, login_name: &str) -> Option<StoreKey> {
        self.records.iter().find_map(|(key, stored)| match &stored.record.data {
            RecordData::User(user) if user.login_name == login_name => Some(*key),
            _ => None,
        })
    }

    /// Finds a project by name.
    pub fn find_project(&self, name: &str) -> Option<StoreKey> {
        self.records.iter().find_map(|(key, stored)| {
            (stored.record.kind() == RecordKind::Project
                && stored.record.name.as_deref() == Some(name))
            .then_some(*key)
        })
    }

    /// Keys of all records of a kind, in key order.
    pub fn records_of_kind(&self, kind: RecordKind) -> Vec<StoreKey> {
        self.records
            .iter()
            .filter(|(_, stored)| stored.record.kind() == kind)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record and the change log.
    ///
    /// Keys and temporary identities keep counting so stale handles can
    /// never alias new records.
    pub fn reset(&mut self) {
        self.records.clear();
        self.identities.clear();
        self.change_log.clear();
    }

    // -------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------

    fn insert(&mut self, record: Record, status: RecordStatus) -> StoreKey {
        let key = StoreKey(self.next_key);
        self.next_key += 1;
        self.identities.insert(record.id, key);
        self.records.insert(key, StoredRecord { record, status });
        if status.is_dirty() {
            self.change_log.push(key);
        }
        key
    }

    fn ensure_unused(&self, id: RecordId) -> Result<(), StoreError> {
        match self.identities.get(&id) {
            Some(&key) => Err(StoreError::IdentityInUse { key, id }),
            None => Ok(()),
        }
    }

    fn stored(&self, key: StoreKey) -> Result<&StoredRecord, StoreError> {
        self.records.get(&key).ok_or(StoreError::RecordNotFound(key))
    }

    fn stored_mut(&mut self, key: StoreKey) -> Result<&mut StoredRecord, StoreError> {
        self.records
            .get_mut(&key)
            .ok_or(StoreError::RecordNotFound(key))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryStore {
    fn change_log(&self) -> Vec<StoreKey> {
        self.change_log.clone()
    }

    fn prune_change_log(&mut self) {
        let kept: IndexSet<StoreKey> = self
            .change_log
            .iter()
            .copied()
            .filter(|key| {
                self.records
                    .get(key)
                    .is_some_and(|stored| stored.status.is_dirty())
            })
            .collect();
        self.change_log = kept.into_iter().collect();
    }

    fn status_of(&self, key: StoreKey) -> Option<RecordStatus> {
        self.records.get(&key).map(|stored| stored.status)
    }

    fn kind_of(&self, key: StoreKey) -> Option<RecordKind> {
        self.records.get(&key).map(|stored| stored.record.kind())
    }

    fn identity_of(&self, key: StoreKey) -> Option<RecordId> {
        self.records.get(&key).map(|stored| stored.record.id)
    }

    fn materialize(&self, key: StoreKey) -> Result<Record, StoreError> {
        Ok(self.stored(key)?.record.clone())
    }

    fn lookup(&self, id: RecordId) -> Option<StoreKey> {
        self.identities.get(&id).copied()
    }

    fn read_foreign_key(
        &self,
        key: StoreKey,
        fk: ForeignKey,
    ) -> Result<Option<RecordId>, StoreError> {
        Ok(self.stored(key)?.record.foreign_key(fk)?)
    }

    fn write_foreign_key(
        &mut self,
        key: StoreKey,
        fk: ForeignKey,
        value: RecordId,
    ) -> Result<(), StoreError> {
        self.stored_mut(key)?.record.set_foreign_key(fk, value)?;
        Ok(())
    }

    fn referencing(&self, fk: ForeignKey, target: RecordId) -> Vec<StoreKey> {
        self.records
            .iter()
            .filter(|(_, stored)| stored.record.kind() == fk.referencer())
            .filter(|(_, stored)| matches!(stored.record.foreign_key(fk), Ok(Some(id)) if id == target))
            .map(|(key, _)| *key)
            .collect()
    }

    fn set_status(&mut self, key: StoreKey, status: RecordStatus) -> Result<(), StoreError> {
        self.stored_mut(key)?.status = status;
        Ok(())
    }

    fn assign_identity(
        &mut self,
        key: StoreKey,
        permanent: RecordId,
    ) -> Result<RecordId, StoreError> {
        if !permanent.is_permanent() {
            return Err(StoreError::NotPermanent(permanent));
        }
        self.ensure_unused(permanent)?;
        let stored = self.stored_mut(key)?;
        let previous = stored.record.id;
        if previous.is_permanent() {
            return Err(StoreError::IdentityAlreadyPermanent { key, id: previous });
        }
        stored.record.id = permanent;
        self.identities.remove(&previous);
        self.identities.insert(permanent, key);
        Ok(previous)
    }

    fn evict(&mut self, key: StoreKey) -> Result<(), StoreError> {
        let stored = self
            .records
            .remove(&key)
            .ok_or(StoreError::RecordNotFound(key))?;
        if self.identities.get(&stored.record.id) == Some(&key) {
            self.identities.remove(&stored.record.id);
        }
        Ok(())
    }
}
