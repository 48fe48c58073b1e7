//! The session-wide save mode.

use serde::Serialize;

use tasks_core::RecordKind;

/// What the save pipeline is currently doing.
///
/// A single value for the whole application: at most one session runs at a
/// time, and while it runs the mode names the tier being committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SaveMode {
    #[default]
    NotSaving,
    Saving,
    SavingUsers,
    SavingProjects,
    SavingTasks,
    SavingWatches,
}

impl SaveMode {
    pub fn is_saving(self) -> bool {
        self != SaveMode::NotSaving
    }

    /// Mode while committing the given tier.
    pub fn for_tier(kind: RecordKind) -> SaveMode {
        match kind {
            RecordKind::User => SaveMode::SavingUsers,
            RecordKind::Project => SaveMode::SavingProjects,
            RecordKind::Task => SaveMode::SavingTasks,
            RecordKind::Watch => SaveMode::SavingWatches,
        }
    }

    /// The tier being committed, if any.
    pub fn tier(self) -> Option<RecordKind> {
        match self {
            SaveMode::SavingUsers => Some(RecordKind::User),
            SaveMode::SavingProjects => Some(RecordKind::Project),
            SaveMode::SavingTasks => Some(RecordKind::Task),
            SaveMode::SavingWatches => Some(RecordKind::Watch),
            SaveMode::NotSaving | SaveMode::Saving => None,
        }
    }
}
