use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::domain::{StudentId, StudentRecord, Submission};
use super::gpa::compute_gpa;
use super::store::{InsertOutcome, RecordStore, StoreError};
use super::validation::{FieldErrors, SubmissionValidator};

/// Service composing the validator, GPA calculator, and record store.
///
/// Holds no per-request state; concurrent submissions for the same student are settled by
/// the store's conditional insert alone.
pub struct SubmissionService<S: ?Sized> {
    store: Arc<S>,
    store_timeout: Duration,
    reference_year: Option<i32>,
}

impl<S> SubmissionService<S>
where
    S: RecordStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
            reference_year: None,
        }
    }

    /// Pin the student id year window instead of following the calendar.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    pub fn validator(&self) -> SubmissionValidator {
        match self.reference_year {
            Some(year) => SubmissionValidator::new(year),
            None => SubmissionValidator::current(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Validate, score, and persist a submission exactly once per student id.
    pub async fn submit(&self, submission: Submission) -> Result<StudentRecord, SubmissionError> {
        let validated = self.validator().validate(&submission).map_err(|errors| {
            info!(
                fields = errors.len(),
                student_id = ?submission_id_hint(&submission),
                "submission rejected by validation"
            );
            SubmissionError::Validation(errors)
        })?;

        let gpa = compute_gpa(&validated.scores);
        let record = validated.into_record(gpa);

        let pending = record.clone();
        let outcome = self
            .call_store(move |store| store.insert_if_absent(&pending))
            .await
            .map_err(|err| {
                log_store_failure(&record.student_id, "insert", &err);
                err
            })?;

        match outcome {
            InsertOutcome::Inserted => {
                info!(student_id = %record.student_id, gpa = record.gpa, "submission stored");
                Ok(record)
            }
            InsertOutcome::AlreadyExists => {
                info!(student_id = %record.student_id, "duplicate submission refused");
                Err(SubmissionError::Duplicate {
                    student_id: record.student_id,
                })
            }
        }
    }

    /// Fetch the stored record for a student, if one exists.
    pub async fn lookup(&self, id: &StudentId) -> Result<Option<StudentRecord>, SubmissionError> {
        let key = id.clone();
        self.call_store(move |store| store.fetch(&key))
            .await
            .map_err(|err| {
                log_store_failure(id, "fetch", &err);
                err
            })
    }

    /// Runs a blocking store call under the request deadline.
    ///
    /// A deadline miss is reported as `TimedOut`; the write may still land afterwards, which a
    /// retried request then observes as a duplicate.
    async fn call_store<T, F>(&self, operation: F) -> Result<T, SubmissionError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || operation(store.as_ref()));

        match tokio::time::timeout(self.store_timeout, task).await {
            Err(_) => Err(SubmissionError::TimedOut {
                after: self.store_timeout,
            }),
            Ok(Err(join)) => Err(SubmissionError::Store(StoreError::Fatal(format!(
                "store worker failed: {join}"
            )))),
            Ok(Ok(result)) => result.map_err(SubmissionError::Store),
        }
    }
}

fn submission_id_hint(submission: &Submission) -> Option<String> {
    submission
        .student_id
        .as_ref()
        .and_then(|value| value.as_text())
        .map(|text| text.into_owned())
}

fn log_store_failure(student_id: &StudentId, operation: &str, err: &SubmissionError) {
    match err {
        SubmissionError::TimedOut { after } => warn!(
            %student_id,
            operation,
            timeout_ms = after.as_millis() as u64,
            "record store did not answer before the deadline"
        ),
        SubmissionError::Store(source) => error!(
            %student_id,
            operation,
            transient = source.is_transient(),
            error = %source,
            "record store call failed"
        ),
        SubmissionError::Validation(_) | SubmissionError::Duplicate { .. } => {}
    }
}

/// Error raised by the submission service.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error("student {student_id} has already submitted their scores")]
    Duplicate { student_id: StudentId },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("record store did not answer within {}ms", .after.as_millis())]
    TimedOut { after: Duration },
}

impl SubmissionError {
    /// Whether repeating the identical request could succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            SubmissionError::Store(err) => err.is_transient(),
            SubmissionError::TimedOut { .. } => true,
            SubmissionError::Validation(_) | SubmissionError::Duplicate { .. } => false,
        }
    }
}
