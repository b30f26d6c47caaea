use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::{InsertOutcome, RecordStore, StoreError};
use crate::submissions::domain::{ScoreSheet, StudentId, StudentRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS student_records (
    student_id  TEXT PRIMARY KEY NOT NULL,
    born_date   TEXT NOT NULL,
    full_name   TEXT NOT NULL,
    assignment1 REAL NOT NULL,
    assignment2 REAL NOT NULL,
    assignment3 REAL NOT NULL,
    midterm1    REAL NOT NULL,
    midterm2    REAL NOT NULL,
    final_exam  REAL NOT NULL,
    gpa         REAL NOT NULL
);";

const INSERT_IF_ABSENT: &str = "
INSERT INTO student_records (
    student_id, born_date, full_name,
    assignment1, assignment2, assignment3, midterm1, midterm2, final_exam, gpa
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(student_id) DO NOTHING";

const SELECT_BY_ID: &str = "
SELECT student_id, born_date, full_name,
       assignment1, assignment2, assignment3, midterm1, midterm2, final_exam, gpa
FROM student_records
WHERE student_id = ?1";

/// SQLite-backed store. The connection is opened once and shared for the life of the process;
/// the primary key plus `ON CONFLICT DO NOTHING` makes the existence check and the write a
/// single statement, which SQLite serializes across connections and processes.
#[derive(Debug)]
pub struct SqliteRecordStore {
    connection: Mutex<Connection>,
    location: Option<PathBuf>,
}

impl SqliteRecordStore {
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(classify)?;
        connection.busy_timeout(busy_timeout).map_err(classify)?;
        let journal_mode: String = connection
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(classify)?;
        tracing::debug!(%journal_mode, path = %path.display(), "opened sqlite record store");
        Self::initialize(connection, Some(path.to_path_buf()))
    }

    /// Private database that disappears with the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(classify)?;
        Self::initialize(connection, None)
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn initialize(connection: Connection, location: Option<PathBuf>) -> Result<Self, StoreError> {
        connection.execute_batch(SCHEMA).map_err(classify)?;
        tracing::debug!(location = ?location, "student record store initialized");
        Ok(Self {
            connection: Mutex::new(connection),
            location,
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Fatal("sqlite connection mutex poisoned".to_string()))
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert_if_absent(&self, record: &StudentRecord) -> Result<InsertOutcome, StoreError> {
        let connection = self.connection()?;
        let scores = &record.scores;
        let changed = connection
            .execute(
                INSERT_IF_ABSENT,
                params![
                    record.student_id.as_str(),
                    record.born_date,
                    record.full_name,
                    scores.assignment1,
                    scores.assignment2,
                    scores.assignment3,
                    scores.midterm1,
                    scores.midterm2,
                    scores.final_exam,
                    record.gpa,
                ],
            )
            .map_err(classify)?;

        match changed {
            0 => Ok(InsertOutcome::AlreadyExists),
            1 => Ok(InsertOutcome::Inserted),
            other => Err(StoreError::Fatal(format!(
                "conditional insert touched {other} rows for {}",
                record.student_id
            ))),
        }
    }

    fn fetch(&self, id: &StudentId) -> Result<Option<StudentRecord>, StoreError> {
        let connection = self.connection()?;
        connection
            .query_row(SELECT_BY_ID, params![id.as_str()], record_from_row)
            .optional()
            .map_err(classify)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord {
        student_id: StudentId(row.get(0)?),
        born_date: row.get(1)?,
        full_name: row.get(2)?,
        scores: ScoreSheet {
            assignment1: row.get(3)?,
            assignment2: row.get(4)?,
            assignment3: row.get(5)?,
            midterm1: row.get(6)?,
            midterm2: row.get(7)?,
            final_exam: row.get(8)?,
        },
        gpa: row.get(9)?,
    })
}

/// Busy and locked databases clear up on their own; anything else is a defect to surface.
fn classify(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::CannotOpen
                    | ErrorCode::SystemIoFailure
            ) =>
        {
            StoreError::Transient(err.to_string())
        }
        _ => StoreError::Fatal(err.to_string()),
    }
}
