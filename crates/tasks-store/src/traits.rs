//! The [`RecordStore`] trait: the contract the save pipeline relies on.
//!
//! The store holds every domain record under a stable [`StoreKey`], tracks a
//! [`RecordStatus`] per record and keeps a change log of keys that left the
//! clean state. The pipeline only reads records, moves them through the
//! commit lifecycle, and rewrites foreign keys; everything else a store does
//! (creating, editing, loading) is backend-specific API.
//!
//! The trait is synchronous. Callers that need to share a store across
//! await points wrap it in an async mutex and only hold the lock for the
//! duration of one call sequence.

use tasks_core::{ForeignKey, Record, RecordId, RecordKind, RecordStatus, StoreKey};

use crate::error::StoreError;

/// Record storage with change tracking.
pub trait RecordStore {
    // -------------------------------------------------------------------
    // Change tracking
    // -------------------------------------------------------------------

    /// Keys touched since the log was last pruned, oldest first.
    ///
    /// A candidate list only: a key may repeat, and may refer to a record
    /// that has since settled back to clean or been evicted.
    fn change_log(&self) -> Vec<StoreKey>;

    /// Drops log entries whose record is clean or no longer held.
    fn prune_change_log(&mut self);

    // -------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------

    /// Current status of a record, or `None` if the key is not held.
    fn status_of(&self, key: StoreKey) -> Option<RecordStatus>;

    /// Kind of a record, or `None` if the key is not held.
    fn kind_of(&self, key: StoreKey) -> Option<RecordKind>;

    /// Current identity attribute of a record, or `None` if the key is not held.
    fn identity_of(&self, key: StoreKey) -> Option<RecordId>;

    /// Returns a snapshot of the record under `key`.
    fn materialize(&self, key: StoreKey) -> Result<Record, StoreError>;

    /// Resolves an identity to its store key.
    fn lookup(&self, id: RecordId) -> Option<StoreKey>;

    // -------------------------------------------------------------------
    // Foreign keys
    // -------------------------------------------------------------------

    /// Reads a foreign-key attribute of the record under `key`.
    fn read_foreign_key(
        &self,
        key: StoreKey,
        fk: ForeignKey,
    ) -> Result<Option<RecordId>, StoreError>;

    /// Rewrites a foreign-key attribute in place.
    ///
    /// This is a relink, not an edit: the record's status and the change
    /// log are left untouched.
    fn write_foreign_key(
        &mut self,
        key: StoreKey,
        fk: ForeignKey,
        value: RecordId,
    ) -> Result<(), StoreError>;

    /// Keys of records whose `fk` attribute currently equals `target`, in
    /// key order.
    ///
    /// With a superseded temporary `target` this is the set of records
    /// disassociated from the record that used to carry that identity.
    fn referencing(&self, fk: ForeignKey, target: RecordId) -> Vec<StoreKey>;

    // -------------------------------------------------------------------
    // Commit lifecycle
    // -------------------------------------------------------------------

    /// Overwrites the lifecycle status of a record.
    fn set_status(&mut self, key: StoreKey, status: RecordStatus) -> Result<(), StoreError>;

    /// Replaces a temporary identity with a server-assigned one.
    ///
    /// Returns the previous identity. Fails if the record already holds a
    /// permanent identity or if `permanent` is not a permanent identity.
    fn assign_identity(
        &mut self,
        key: StoreKey,
        permanent: RecordId,
    ) -> Result<RecordId, StoreError>;

    /// Removes a record after its destruction has been persisted.
    fn evict(&mut self, key: StoreKey) -> Result<(), StoreError>;
}
