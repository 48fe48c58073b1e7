//! Record kinds, persistence operations and record lifecycle status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four domain record types, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    User,
    Project,
    Task,
    Watch,
}

impl RecordKind {
    /// All kinds in declaration order.
    pub const ALL: [RecordKind; 4] = [
        RecordKind::User,
        RecordKind::Project,
        RecordKind::Task,
        RecordKind::Watch,
    ];

    /// Resource name used in remote paths (`tasks-server/<name>`).
    pub fn resource_name(self) -> &'static str {
        match self {
            RecordKind::User => "user",
            RecordKind::Project => "project",
            RecordKind::Task => "task",
            RecordKind::Watch => "watch",
        }
    }

    /// Inverse of [`RecordKind::resource_name`].
    pub fn from_resource_name(name: &str) -> Option<RecordKind> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.resource_name() == name)
    }

    /// Dense index, used for per-kind arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::User => "User",
            RecordKind::Project => "Project",
            RecordKind::Task => "Task",
            RecordKind::Watch => "Watch",
        };
        f.write_str(name)
    }
}

/// The remote persist operation a dirty record needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Destroy,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

/// Lifecycle status of a record held by the store.
///
/// `Committing` and `Error` carry the operation in flight (or the one that
/// failed) so that a later save session retries the same operation.
/// `Superseded` is a record edited or deleted locally while `sent` was in
/// flight: once that commit settles the record still needs `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    Clean,
    New,
    Modified,
    Destroyed,
    Committing(Operation),
    Superseded { sent: Operation, next: Operation },
    Error(Operation),
}

impl RecordStatus {
    /// The remote operation this status calls for, if any.
    pub fn pending_operation(self) -> Option<Operation> {
        match self {
            RecordStatus::Clean => None,
            RecordStatus::New => Some(Operation::Create),
            RecordStatus::Modified => Some(Operation::Update),
            RecordStatus::Destroyed => Some(Operation::Destroy),
            RecordStatus::Committing(op) | RecordStatus::Error(op) => Some(op),
            RecordStatus::Superseded { sent, .. } => Some(sent),
        }
    }

    /// True while a commit for this record is outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            RecordStatus::Committing(_) | RecordStatus::Superseded { .. }
        )
    }

    /// True when the record has uncommitted local changes.
    pub fn is_dirty(self) -> bool {
        self.pending_operation().is_some()
    }

    /// Status after a local attribute edit.
    ///
    /// A clean record becomes modified and a record in flight is superseded
    /// by an update. Anything already awaiting a create, update, destroy or
    /// retry keeps its pending operation.
    pub fn after_edit(self) -> RecordStatus {
        match self {
            RecordStatus::Clean => RecordStatus::Modified,
            RecordStatus::Committing(sent) if sent != Operation::Destroy => {
                RecordStatus::Superseded {
                    sent,
                    next: Operation::Update,
                }
            }
            other => other,
        }
    }

    /// Status after a local delete of a record the server may know about.
    ///
    /// A record in flight keeps its commit and is destroyed once it settles.
    pub fn after_destroy(self) -> RecordStatus {
        match self {
            RecordStatus::Committing(Operation::Destroy) => self,
            RecordStatus::Committing(sent) | RecordStatus::Superseded { sent, .. } => {
                RecordStatus::Superseded {
                    sent,
                    next: Operation::Destroy,
                }
            }
            _ => RecordStatus::Destroyed,
        }
    }

    /// Status once the in-flight commit has been acknowledged.
    pub fn after_commit(self) -> RecordStatus {
        match self {
            RecordStatus::Committing(_) => RecordStatus::Clean,
            RecordStatus::Superseded {
                next: Operation::Destroy,
                ..
            } => RecordStatus::Destroyed,
            RecordStatus::Superseded { .. } => RecordStatus::Modified,
            other => other,
        }
    }

    /// Status once the in-flight commit has failed, or `None` when the record
    /// should be dropped: a create that never went through followed by a
    /// local delete leaves nothing to persist.
    pub fn after_failure(self) -> Option<RecordStatus> {
        match self {
            RecordStatus::Committing(op) => Some(RecordStatus::Error(op)),
            RecordStatus::Superseded {
                sent: Operation::Create,
                next: Operation::Destroy,
            } => None,
            RecordStatus::Superseded {
                next: Operation::Destroy,
                ..
            } => Some(RecordStatus::Destroyed),
            RecordStatus::Superseded { sent, .. } => Some(RecordStatus::Error(sent)),
            other => Some(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_operation_per_status() {
        assert_eq!(RecordStatus::Clean.pending_operation(), None);
        assert_eq!(RecordStatus::New.pending_operation(), Some(Operation::Create));
        assert_eq!(RecordStatus::Modified.pending_operation(), Some(Operation::Update));
        assert_eq!(RecordStatus::Destroyed.pending_operation(), Some(Operation::Destroy));
        assert_eq!(
            RecordStatus::Error(Operation::Create).pending_operation(),
            Some(Operation::Create)
        );
        assert_eq!(
            RecordStatus::Committing(Operation::Update).pending_operation(),
            Some(Operation::Update)
        );
    }

    #[test]
    fn only_clean_is_not_dirty() {
        assert!(!RecordStatus::Clean.is_dirty());
        assert!(RecordStatus::New.is_dirty());
        assert!(RecordStatus::Error(Operation::Destroy).is_dirty());
    }

    #[test]
    fn edit_transitions() {
        assert_eq!(RecordStatus::Clean.after_edit(), RecordStatus::Modified);
        assert_eq!(RecordStatus::New.after_edit(), RecordStatus::New);
        assert_eq!(
            RecordStatus::Error(Operation::Create).after_edit(),
            RecordStatus::Error(Operation::Create)
        );
    }

    #[test]
    fn changes_during_a_commit_are_kept() {
        let create = RecordStatus::Committing(Operation::Create);
        let renamed = create.after_edit();
        assert_eq!(
            renamed,
            RecordStatus::Superseded {
                sent: Operation::Create,
                next: Operation::Update
            }
        );
        assert_eq!(renamed.pending_operation(), Some(Operation::Create));
        assert_eq!(renamed.after_edit(), renamed);
        assert_eq!(renamed.after_commit(), RecordStatus::Modified);
        assert_eq!(renamed.after_failure(), Some(RecordStatus::Error(Operation::Create)));

        let deleted = renamed.after_destroy();
        assert_eq!(deleted.after_edit(), deleted);
        assert_eq!(deleted.after_commit(), RecordStatus::Destroyed);
        assert_eq!(deleted.after_failure(), None);

        let update = RecordStatus::Committing(Operation::Update).after_destroy();
        assert_eq!(update.after_commit(), RecordStatus::Destroyed);
        assert_eq!(update.after_failure(), Some(RecordStatus::Destroyed));

        let destroy = RecordStatus::Committing(Operation::Destroy);
        assert_eq!(destroy.after_edit(), destroy);
        assert_eq!(destroy.after_destroy(), destroy);
    }

    #[test]
    fn settled_commits() {
        assert_eq!(
            RecordStatus::Committing(Operation::Update).after_commit(),
            RecordStatus::Clean
        );
        assert_eq!(
            RecordStatus::Committing(Operation::Create).after_failure(),
            Some(RecordStatus::Error(Operation::Create))
        );
        assert!(RecordStatus::Committing(Operation::Create).is_in_flight());
        assert!(!RecordStatus::Error(Operation::Create).is_in_flight());
        assert_eq!(RecordStatus::Modified.after_destroy(), RecordStatus::Destroyed);
    }

    #[test]
    fn kinds_are_declared_in_dependency_friendly_order() {
        let indices: Vec<usize> = RecordKind::ALL.iter().map(|k| k.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(RecordKind::Watch.resource_name(), "watch");
        assert_eq!(RecordKind::from_resource_name("task"), Some(RecordKind::Task));
        assert_eq!(RecordKind::from_resource_name("Task"), None);
        assert_eq!(RecordKind::Project.to_string(), "Project");
    }
}
