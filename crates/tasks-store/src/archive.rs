//! SQLite-backed record archive.
//!
//! [`SqliteArchive`] plays the server's part when the client runs offline:
//! it hands out permanent identities on insert and refuses records whose
//! foreign keys point at anything it does not hold. Every write runs in a
//! transaction; records are stored as JSON TEXT via serde_json.

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use tasks_core::{ForeignKey, Record, RecordId, RecordKind};

use crate::error::StoreError;

/// SQLite-backed archive of persisted records.
pub struct SqliteArchive {
    conn: Connection,
}

impl SqliteArchive {
    /// Opens (or creates) an archive database at `path`.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteArchive { conn })
    }

    /// Opens an in-memory archive (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteArchive { conn })
    }

    /// Persists a new record and returns its permanent identity.
    pub fn insert(&mut self, record: &Record) -> Result<RecordId, StoreError> {
        let tx = self.conn.transaction()?;
        check_references(&tx, record)?;
        let data = serde_json::to_string(record)?;
        tx.execute(
            "INSERT INTO records (kind, data) VALUES (?1, ?2)",
            params![record.kind().resource_name(), data],
        )?;
        let id = RecordId(tx.last_insert_rowid());
        tx.commit()?;
        Ok(id)
    }

    /// Overwrites a persisted record.
    pub fn update(&mut self, record: &Record) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        expect_kind(&tx, record.id, record.kind())?;
        check_references(&tx, record)?;
        let data = serde_json::to_string(record)?;
        tx.execute(
            "UPDATE records SET data = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![data, record.id.0],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Deletes a persisted record.
    pub fn delete(&mut self, kind: RecordKind, id: RecordId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        expect_kind(&tx, id, kind)?;
        tx.execute("DELETE FROM records WHERE id = ?1", params![id.0])?;
        tx.commit()?;
        Ok(())
    }

    /// Loads one persisted record.
    pub fn get(&self, id: RecordId) -> Result<Record, StoreError> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM records WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;
        let data = data.ok_or(StoreError::IdentityNotFound(id))?;
        decode(id, &data)
    }

    /// Lists persisted records in identity order, optionally of one kind.
    pub fn list(&self, kind: Option<RecordKind>) -> Result<Vec<Record>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, data FROM records WHERE ?1 IS NULL OR kind = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![kind.map(RecordKind::resource_name)], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, data) = row?;
            records.push(decode(RecordId(id), &data)?);
        }
        Ok(records)
    }
}

/// Parses a stored payload; the row id is authoritative for the identity.
fn decode(id: RecordId, data: &str) -> Result<Record, StoreError> {
    let mut record: Record = serde_json::from_str(data)?;
    record.id = id;
    Ok(record)
}

fn kind_of(tx: &Transaction<'_>, id: RecordId) -> Result<Option<RecordKind>, StoreError> {
    let kind: Option<String> = tx
        .query_row(
            "SELECT kind FROM records WHERE id = ?1",
            params![id.0],
            |row| row.get(0),
        )
        .optional()?;
    Ok(kind.as_deref().and_then(RecordKind::from_resource_name))
}

fn expect_kind(tx: &Transaction<'_>, id: RecordId, expected: RecordKind) -> Result<(), StoreError> {
    match kind_of(tx, id)? {
        Some(found) if found == expected => Ok(()),
        Some(found) => Err(StoreError::WrongKind {
            id,
            expected,
            found,
        }),
        None => Err(StoreError::IdentityNotFound(id)),
    }
}

/// Rejects records whose foreign keys do not resolve to archived records of
/// the right kind.
fn check_references(tx: &Transaction<'_>, record: &Record) -> Result<(), StoreError> {
    for fk in ForeignKey::ALL
        .into_iter()
        .filter(|fk| fk.referencer() == record.kind())
    {
        let Some(id) = record.foreign_key(fk)? else {
            continue;
        };
        let dangling = StoreError::DanglingReference {
            field: fk.field_name(),
            id,
            target: fk.target(),
        };
        if id.is_temporary() || kind_of(tx, id)? != Some(fk.target()) {
            return Err(dangling);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasks_core::record::{Project, Task, User, Watch};
    use tasks_core::RecordData;

    fn user(login: &str) -> Record {
        Record::new(
            RecordId(-1),
            RecordData::User(User {
                login_name: login.into(),
                role: Default::default(),
            }),
        )
    }

    fn task(project: Option<RecordId>, assignee: Option<RecordId>) -> Record {
        Record::new(
            RecordId(-2),
            RecordData::Task(Task {
                project_id: project,
                assignee_id: assignee,
                ..Task::default()
            }),
        )
    }

    #[test]
    fn insert_assigns_increasing_permanent_ids() {
        let mut archive = SqliteArchive::in_memory().unwrap();
        let a = archive.insert(&user("a")).unwrap();
        let b = archive.insert(&user("b")).unwrap();
        assert!(a.is_permanent());
        assert!(b > a);

        let stored = archive.get(b).unwrap();
        assert_eq!(stored.id, b);
        assert_eq!(stored.kind(), RecordKind::User);
    }

    #[test]
    fn references_must_resolve() {
        let mut archive = SqliteArchive::in_memory().unwrap();
        let err = archive.insert(&task(None, Some(RecordId(-1)))).unwrap_err();
        assert!(matches!(
            err,
            StoreError::DanglingReference { field: "assigneeId", .. }
        ));

        let u = archive.insert(&user("a")).unwrap();
        // A user id is not a project id.
        let err = archive.insert(&task(Some(u), None)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::DanglingReference { target: RecordKind::Project, .. }
        ));

        let p = archive
            .insert(&Record::new(RecordId(-3), RecordData::Project(Project::default())))
            .unwrap();
        let t = archive.insert(&task(Some(p), Some(u))).unwrap();
        let w = archive
            .insert(&Record::new(
                RecordId(-4),
                RecordData::Watch(Watch {
                    task_id: t,
                    user_id: u,
                }),
            ))
            .unwrap();
        assert_eq!(archive.list(None).unwrap().len(), 4);
        assert_eq!(archive.get(w).unwrap().foreign_key(ForeignKey::WatchedTask).unwrap(), Some(t));
    }

    #[test]
    fn update_and_delete_check_kind() {
        let mut archive = SqliteArchive::in_memory().unwrap();
        let id = archive.insert(&user("a")).unwrap();

        let mut renamed = user("renamed");
        renamed.id = id;
        archive.update(&renamed).unwrap();
        match archive.get(id).unwrap().data {
            RecordData::User(u) => assert_eq!(u.login_name, "renamed"),
            other => panic!("expected user, got {other:?}"),
        }

        assert!(matches!(
            archive.delete(RecordKind::Task, id),
            Err(StoreError::WrongKind { found: RecordKind::User, .. })
        ));
        archive.delete(RecordKind::User, id).unwrap();
        assert!(matches!(archive.get(id), Err(StoreError::IdentityNotFound(_))));
        assert!(matches!(
            archive.delete(RecordKind::User, id),
            Err(StoreError::IdentityNotFound(_))
        ));
    }

    #[test]
    fn list_filters_by_kind() {
        let mut archive = SqliteArchive::in_memory().unwrap();
        archive.insert(&user("a")).unwrap();
        archive
            .insert(&Record::new(RecordId(-9), RecordData::Project(Project::default())))
            .unwrap();
        archive.insert(&user("b")).unwrap();

        let users = archive.list(Some(RecordKind::User)).unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|r| r.kind() == RecordKind::User));
        assert_eq!(archive.list(Some(RecordKind::Watch)).unwrap().len(), 0);
    }

    #[test]
    fn file_backed_archive_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");
        let path = path.to_str().unwrap();

        let id = {
            let mut archive = SqliteArchive::open(path).unwrap();
            archive.insert(&user("persisted")).unwrap()
        };
        let archive = SqliteArchive::open(path).unwrap();
        assert_eq!(archive.get(id).unwrap().id, id);
    }
}
