//! Core error types for tasks-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! failures in the record model itself.

use thiserror::Error;

use crate::types::RecordKind;

/// Core errors produced by the tasks-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A foreign-key attribute was addressed on a record kind that lacks it.
    #[error("record kind {kind} has no foreign key '{field}'")]
    ForeignKeyMismatch { field: &'static str, kind: RecordKind },

    /// The kind reference graph has a cycle, so no persistence order exists.
    #[error("schema cycle between kinds: {kinds:?}")]
    SchemaCycle { kinds: Vec<RecordKind> },

    /// An effort string could not be parsed.
    #[error("invalid effort: '{value}'")]
    InvalidEffort { value: String },
}
