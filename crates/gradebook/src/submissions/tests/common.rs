use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use serde_json::{json, Value};

use crate::submissions::domain::{StudentId, StudentRecord, Submission};
use crate::submissions::store::{InsertOutcome, MemoryRecordStore, RecordStore, StoreError};
use crate::submissions::SubmissionService;

pub(super) const REFERENCE_YEAR: i32 = 2025;
pub(super) const STUDENT_ID: &str = "2025AB1234";

pub(super) fn submission_json() -> Value {
    json!({
        "studentId": STUDENT_ID,
        "bornDate": "2004",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "assignment1": "90",
        "assignment2": 85,
        "assignment3": "95",
        "midterm1": 80,
        "midterm2": "88",
        "final": 92,
    })
}

pub(super) fn submission() -> Submission {
    serde_json::from_value(submission_json()).expect("fixture deserializes")
}

pub(super) fn submission_with(field: &str, value: Value) -> Submission {
    let mut payload = submission_json();
    payload[field] = value;
    serde_json::from_value(payload).expect("fixture deserializes")
}

pub(super) fn service_with<S>(store: Arc<S>) -> SubmissionService<S>
where
    S: RecordStore + 'static,
{
    SubmissionService::new(store, Duration::from_secs(2)).with_reference_year(REFERENCE_YEAR)
}

pub(super) fn build_service() -> (SubmissionService<MemoryRecordStore>, Arc<MemoryRecordStore>) {
    let store = Arc::new(MemoryRecordStore::default());
    (service_with(store.clone()), store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Store that refuses every call with the configured error.
pub(super) struct FailingStore {
    pub(super) transient: bool,
}

impl FailingStore {
    fn error(&self) -> StoreError {
        if self.transient {
            StoreError::Transient("database is locked".to_string())
        } else {
            StoreError::Fatal("no such table: student_records".to_string())
        }
    }
}

impl RecordStore for FailingStore {
    fn insert_if_absent(&self, _record: &StudentRecord) -> Result<InsertOutcome, StoreError> {
        Err(self.error())
    }

    fn fetch(&self, _id: &StudentId) -> Result<Option<StudentRecord>, StoreError> {
        Err(self.error())
    }
}

/// Fails the first insert with a transient error, either before or after the write lands.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: MemoryRecordStore,
    pub(super) write_before_failing: bool,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub(super) fn losing_acknowledgement() -> Self {
        Self {
            write_before_failing: true,
            ..Self::default()
        }
    }

    pub(super) fn unreachable_once() -> Self {
        Self::default()
    }
}

impl RecordStore for FlakyStore {
    fn insert_if_absent(&self, record: &StudentRecord) -> Result<InsertOutcome, StoreError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            if self.write_before_failing {
                self.inner.insert_if_absent(record)?;
            }
            return Err(StoreError::Transient("connection reset".to_string()));
        }
        self.inner.insert_if_absent(record)
    }

    fn fetch(&self, id: &StudentId) -> Result<Option<StudentRecord>, StoreError> {
        self.inner.fetch(id)
    }
}

/// Store that answers only after a delay.
pub(super) struct SlowStore {
    pub(super) inner: MemoryRecordStore,
    pub(super) delay: Duration,
}

impl RecordStore for SlowStore {
    fn insert_if_absent(&self, record: &StudentRecord) -> Result<InsertOutcome, StoreError> {
        std::thread::sleep(self.delay);
        self.inner.insert_if_absent(record)
    }

    fn fetch(&self, id: &StudentId) -> Result<Option<StudentRecord>, StoreError> {
        std::thread::sleep(self.delay);
        self.inner.fetch(id)
    }
}

pub(super) fn submission_without(field: &str) -> Submission {
    let mut payload = submission_json();
    payload
        .as_object_mut()
        .expect("fixture is an object")
        .remove(field);
    serde_json::from_value(payload).expect("fixture deserializes")
}
