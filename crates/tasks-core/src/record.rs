//! Domain records and their foreign keys.
//!
//! A [`Record`] is the unit the store tracks and the save pipeline persists.
//! The per-kind payload lives in [`RecordData`]; references between records
//! are plain [`RecordId`] attributes addressed through [`ForeignKey`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::RecordId;
use crate::types::RecordKind;

/// A tracked domain record.
///
/// Serializes to the flat JSON object the tasks server expects: the common
/// attributes plus the payload fields and a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    /// One-line summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Multi-line notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub data: RecordData,
}

/// Per-kind record payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecordData {
    User(User),
    Project(Project),
    Task(Task),
    Watch(Watch),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub login_name: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    Manager,
    #[default]
    Developer,
    Tester,
    Guest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Remaining effort, e.g. `"12d"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_left: Option<String>,
    /// Date the project became active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter_id: Option<RecordId>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    /// Estimated effort, e.g. `"3d"` or `"4h"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Planned,
    Active,
    Done,
    Risky,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watch {
    pub task_id: RecordId,
    pub user_id: RecordId,
}

/// A foreign-key attribute: which kind holds it and which kind it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ForeignKey {
    /// Task -> User (`assigneeId`).
    Assignee,
    /// Task -> User (`submitterId`).
    Submitter,
    /// Task -> Project (`projectId`).
    Project,
    /// Watch -> Task (`taskId`).
    WatchedTask,
    /// Watch -> User (`userId`).
    Watcher,
}

impl ForeignKey {
    pub const ALL: [ForeignKey; 5] = [
        ForeignKey::Assignee,
        ForeignKey::Submitter,
        ForeignKey::Project,
        ForeignKey::WatchedTask,
        ForeignKey::Watcher,
    ];

    /// The kind of record carrying this attribute.
    pub fn referencer(self) -> RecordKind {
        match self {
            ForeignKey::Assignee | ForeignKey::Submitter | ForeignKey::Project => {
                RecordKind::Task
            }
            ForeignKey::WatchedTask | ForeignKey::Watcher => RecordKind::Watch,
        }
    }

    /// The kind of record this attribute points at.
    pub fn target(self) -> RecordKind {
        match self {
            ForeignKey::Assignee | ForeignKey::Submitter | ForeignKey::Watcher => {
                RecordKind::User
            }
            ForeignKey::Project => RecordKind::Project,
            ForeignKey::WatchedTask => RecordKind::Task,
        }
    }

    /// Wire attribute name.
    pub fn field_name(self) -> &'static str {
        match self {
            ForeignKey::Assignee => "assigneeId",
            ForeignKey::Submitter => "submitterId",
            ForeignKey::Project => "projectId",
            ForeignKey::WatchedTask => "taskId",
            ForeignKey::Watcher => "userId",
        }
    }
}

impl RecordData {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordData::User(_) => RecordKind::User,
            RecordData::Project(_) => RecordKind::Project,
            RecordData::Task(_) => RecordKind::Task,
            RecordData::Watch(_) => RecordKind::Watch,
        }
    }
}

impl Record {
    /// Creates a record with no name or description.
    pub fn new(id: RecordId, data: RecordData) -> Self {
        Record {
            id,
            name: None,
            description: None,
            data,
        }
    }

    /// Sets the one-line summary.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.data.kind()
    }

    /// Reads a foreign-key attribute.
    ///
    /// Fails with [`CoreError::ForeignKeyMismatch`] when this record's kind
    /// does not carry `fk`.
    pub fn foreign_key(&self, fk: ForeignKey) -> Result<Option<RecordId>, CoreError> {
        match (&self.data, fk) {
            (RecordData::Task(task), ForeignKey::Assignee) => Ok(task.assignee_id),
            (RecordData::Task(task), ForeignKey::Submitter) => Ok(task.submitter_id),
            (RecordData::Task(task), ForeignKey::Project) => Ok(task.project_id),
            (RecordData::Watch(watch), ForeignKey::WatchedTask) => Ok(Some(watch.task_id)),
            (RecordData::Watch(watch), ForeignKey::Watcher) => Ok(Some(watch.user_id)),
            _ => Err(self.mismatch(fk)),
        }
    }

    /// Overwrites a foreign-key attribute.
    pub fn set_foreign_key(&mut self, fk: ForeignKey, value: RecordId) -> Result<(), CoreError> {
        let mismatch = self.mismatch(fk);
        match (&mut self.data, fk) {
            (RecordData::Task(task), ForeignKey::Assignee) => task.assignee_id = Some(value),
            (RecordData::Task(task), ForeignKey::Submitter) => task.submitter_id = Some(value),
            (RecordData::Task(task), ForeignKey::Project) => task.project_id = Some(value),
            (RecordData::Watch(watch), ForeignKey::WatchedTask) => watch.task_id = value,
            (RecordData::Watch(watch), ForeignKey::Watcher) => watch.user_id = value,
            _ => return Err(mismatch),
        }
        Ok(())
    }

    fn mismatch(&self, fk: ForeignKey) -> CoreError {
        CoreError::ForeignKeyMismatch {
            field: fk.field_name(),
            kind: self.kind(),
        }
    }
}
