//! Identity newtypes for tracked records.
//!
//! Two kinds of identity exist side by side:
//! - [`StoreKey`] is the stable handle the record store hands out. It never
//!   changes for the lifetime of a record, so queues and the change log are
//!   keyed by it.
//! - [`RecordId`] is the record's `id` attribute. Locally created records get
//!   a negative, temporary id from [`TemporaryIds`]; the server replaces it
//!   with a positive, permanent one on first successful creation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable store handle for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey(pub u32);

/// Identity attribute of a record (temporary when negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// True for client-assigned placeholder identities.
    pub fn is_temporary(self) -> bool {
        self.0 < 0
    }

    /// True for server-assigned identities.
    pub fn is_permanent(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocator for temporary record identities.
///
/// Hands out -1, -2, -3, ... so temporary ids can never collide with the
/// server's positive identity space.
#[derive(Debug, Clone)]
pub struct TemporaryIds {
    next: i64,
}

impl TemporaryIds {
    pub fn new() -> Self {
        TemporaryIds { next: -1 }
    }

    /// Returns the next temporary identity.
    pub fn allocate(&mut self) -> RecordId {
        let id = RecordId(self.next);
        self.next -= 1;
        id
    }

    /// Ensures future allocations stay below an externally chosen temporary id.
    ///
    /// Used when a caller seeds a new record with its own placeholder id.
    pub fn reserve(&mut self, id: RecordId) {
        if id.is_temporary() && id.0 <= self.next {
            self.next = id.0 - 1;
        }
    }
}

impl Default for TemporaryIds {
    fn default() -> Self {
        Self::new()
    }
}
