use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{InsertOutcome, RecordStore, StoreError};
use crate::submissions::domain::{StudentId, StudentRecord};

/// Process-local store; one mutex acquisition covers the existence check and the write.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecordStore {
    records: Arc<Mutex<HashMap<StudentId, StudentRecord>>>,
}

impl MemoryRecordStore {
    pub fn len(&self) -> usize {
        self.lock().map(|guard| guard.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<StudentId, StudentRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Fatal("record map mutex poisoned".to_string()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert_if_absent(&self, record: &StudentRecord) -> Result<InsertOutcome, StoreError> {
        let mut guard = self.lock()?;
        match guard.entry(record.student_id.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    fn fetch(&self, id: &StudentId) -> Result<Option<StudentRecord>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }
}
