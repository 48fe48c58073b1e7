//! Store fixtures for `tasks save`.
//!
//! A fixture is a JSON array of entries, each describing one record and the
//! state it should be in before the save runs:
//!
//! ```json
//! [
//!   { "status": "new", "id": -5, "record": { "type": "User", "loginName": "sam" } },
//!   { "status": "new", "record": { "type": "Task", "assigneeId": -5 }, "name": "Ship it" },
//!   { "status": "destroyed", "id": 12, "record": { "type": "Project" } }
//! ]
//! ```
//!
//! `clean`, `modified` and `destroyed` entries describe records the server
//! already holds and need a permanent `id`. `new` entries take an optional
//! temporary one; `-1` and `-2` belong to the synthetic projects.

use serde::Deserialize;
use thiserror::Error;

use tasks_core::{Record, RecordData, RecordId};
use tasks_store::{InMemoryStore, StoreError, SyntheticProjects};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    Clean,
    New,
    Modified,
    Destroyed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FixtureEntry {
    pub status: FixtureStatus,
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub record: RecordData,
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid fixture: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("entry {index}: a {status:?} record needs a permanent id")]
    MissingId { index: usize, status: FixtureStatus },

    #[error("entry {index}: {source}")]
    Store {
        index: usize,
        #[source]
        source: StoreError,
    },
}

pub fn parse(json: &str) -> Result<Vec<FixtureEntry>, FixtureError> {
    Ok(serde_json::from_str(json)?)
}

pub fn read(path: &str) -> Result<Vec<FixtureEntry>, FixtureError> {
    parse(&std::fs::read_to_string(path)?)
}

/// Builds a store holding the synthetic projects plus every fixture entry.
pub fn load(entries: Vec<FixtureEntry>) -> Result<(InMemoryStore, SyntheticProjects), FixtureError> {
    let (mut store, synthetic) = InMemoryStore::with_synthetic_projects();
    for (index, entry) in entries.into_iter().enumerate() {
        load_entry(&mut store, entry).map_err(|err| match err {
            EntryError::MissingId(status) => FixtureError::MissingId { index, status },
            EntryError::Store(source) => FixtureError::Store { index, source },
        })?;
    }
    Ok((store, synthetic))
}

enum EntryError {
    MissingId(FixtureStatus),
    Store(StoreError),
}

impl From<StoreError> for EntryError {
    fn from(err: StoreError) -> Self {
        EntryError::Store(err)
    }
}

fn load_entry(store: &mut InMemoryStore, entry: FixtureEntry) -> Result<(), EntryError> {
    let FixtureEntry {
        status,
        id,
        name,
        description,
        record: data,
    } = entry;

    let key = match (status, id) {
        (FixtureStatus::New, None) => {
            let key = store.create_record(data);
            if name.is_some() || description.is_some() {
                store.update_record(key, |record| {
                    record.name = name;
                    record.description = description;
                })?;
            }
            return Ok(());
        }
        (FixtureStatus::New, Some(id)) => {
            store.create_record_with_id(with_text(Record::new(id, data), name, description))?;
            return Ok(());
        }
        (_, None) => return Err(EntryError::MissingId(status)),
        (_, Some(id)) => store.load_record(with_text(Record::new(id, data), name, description))?,
    };

    match status {
        FixtureStatus::Modified => store.update_record(key, |_| {})?,
        FixtureStatus::Destroyed => store.destroy_record(key)?,
        FixtureStatus::Clean | FixtureStatus::New => {}
    }
    Ok(())
}

fn with_text(mut record: Record, name: Option<String>, description: Option<String>) -> Record {
    record.name = name;
    record.description = description;
    record
}
