//! Foreign-key relinking after an identity change.
//!
//! When a create commits, the record's temporary id is replaced by the
//! server's. Records that referenced the temporary id still hold it; the
//! relinker finds them through the schema graph and rewrites each reference
//! to the permanent id, without marking anything dirty.

use tracing::debug;

use tasks_core::{RecordId, RecordKind, SchemaGraph};
use tasks_store::{RecordStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct Relinker {
    schema: SchemaGraph,
}

impl Relinker {
    pub fn new(schema: SchemaGraph) -> Self {
        Relinker { schema }
    }

    pub fn schema(&self) -> &SchemaGraph {
        &self.schema
    }

    /// Rewrites every reference to `previous` held by records that can
    /// reference `kind`, and returns how many attributes changed.
    pub fn relink<S>(
        &self,
        store: &mut S,
        kind: RecordKind,
        previous: RecordId,
        current: RecordId,
    ) -> Result<usize, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        if previous == current {
            return Ok(0);
        }

        let mut rewritten = 0;
        for fk in self.schema.dependents(kind) {
            for key in store.referencing(fk, previous) {
                store.write_foreign_key(key, fk, current)?;
                debug!(
                    %key,
                    field = fk.field_name(),
                    from = %previous,
                    to = %current,
                    "relinked foreign key"
                );
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }
}
