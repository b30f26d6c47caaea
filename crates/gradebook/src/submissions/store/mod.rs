//! Durable student records keyed by student id.
//!
//! The only write is [`RecordStore::insert_if_absent`], which must check for an existing key
//! and write in one indivisible step. Implementations never expose update or delete.

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use super::domain::{StudentId, StudentRecord};

/// Result of a conditional insert that reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No record existed at the time of the check; this one is now durable.
    Inserted,
    /// A record already existed for the key and nothing was written.
    AlreadyExists,
}

/// Storage abstraction so the submission service can be exercised in isolation.
pub trait RecordStore: Send + Sync {
    /// Atomically writes `record` unless its student id is already present.
    fn insert_if_absent(&self, record: &StudentRecord) -> Result<InsertOutcome, StoreError>;
    fn fetch(&self, id: &StudentId) -> Result<Option<StudentRecord>, StoreError>;
}

/// Failure talking to the store; never evidence that a record does or does not exist.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Busy, locked, or unreachable. Retrying the whole request is safe.
    #[error("record store temporarily unavailable: {0}")]
    Transient(String),
    /// The store rejected the operation itself (schema, constraint, malformed item).
    #[error("record store rejected the operation: {0}")]
    Fatal(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}
