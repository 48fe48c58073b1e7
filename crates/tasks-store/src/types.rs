//! Store-level types shared with the save pipeline.

use serde::{Deserialize, Serialize};

use tasks_core::StoreKey;

/// Keys of the two aggregation projects the client builds for its views.
///
/// "All Tasks" and "Unallocated Tasks" live in the store so list views can
/// bind to them, but they are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticProjects {
    pub all_tasks: StoreKey,
    pub unallocated_tasks: StoreKey,
}

impl SyntheticProjects {
    pub const ALL_TASKS_NAME: &'static str = "All Tasks";
    pub const UNALLOCATED_TASKS_NAME: &'static str = "Unallocated Tasks";

    pub fn contains(&self, key: StoreKey) -> bool {
        key == self.all_tasks || key == self.unallocated_tasks
    }
}
