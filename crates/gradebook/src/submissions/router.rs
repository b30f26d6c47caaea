use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use super::domain::{StudentId, StudentRecord, Submission};
use super::service::{SubmissionError, SubmissionService};
use super::store::RecordStore;

pub const STORED_MESSAGE: &str = "GPA calculated and stored successfully";
pub const FAILURE_MESSAGE: &str = "Error calculating and storing GPA";
pub const TIMEOUT_MESSAGE: &str = "The grade service took too long to respond. Please try again.";

/// Router builder exposing the submission and lookup endpoints.
pub fn submission_router<S>(service: Arc<SubmissionService<S>>) -> Router
where
    S: RecordStore + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/submissions", post(submit_handler::<S>))
        .route("/api/v1/submissions/:student_id", get(record_handler::<S>))
        .with_state(service)
}

/// Body returned once a record has been written.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredView {
    pub message: &'static str,
    pub student_id: StudentId,
    pub full_name: String,
    pub gpa: f64,
}

impl From<StudentRecord> for StoredView {
    fn from(record: StudentRecord) -> Self {
        Self {
            message: STORED_MESSAGE,
            student_id: record.student_id,
            full_name: record.full_name,
            gpa: record.gpa,
        }
    }
}

pub fn duplicate_message(student_id: &StudentId) -> String {
    format!(
        "Student with ID {student_id} has already submitted their scores. \
         Please contact student services for more information."
    )
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<SubmissionService<S>>>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "submission body rejected");
            let payload = json!({
                "message": "Request body must be a JSON object with the submission fields",
                "details": [],
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    match service.submit(submission).await {
        Ok(record) => (StatusCode::CREATED, Json(StoredView::from(record))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn record_handler<S>(
    State(service): State<Arc<SubmissionService<S>>>,
    Path(student_id): Path<String>,
) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    let id = StudentId(student_id);
    match service.lookup(&id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => {
            let payload = json!({
                "message": format!("No submission found for student ID {id}"),
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Maps service failures onto the response contract; infrastructure detail stays in the logs.
fn error_response(err: SubmissionError) -> Response {
    let retriable = err.is_retriable();
    let (status, payload) = match err {
        SubmissionError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "message": "Please correct the highlighted fields before submitting.",
                "details": errors,
            }),
        ),
        SubmissionError::Duplicate { student_id } => (
            StatusCode::CONFLICT,
            json!({
                "message": duplicate_message(&student_id),
                "studentId": student_id,
            }),
        ),
        SubmissionError::TimedOut { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, json!({ "message": TIMEOUT_MESSAGE }))
        }
        SubmissionError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "message": FAILURE_MESSAGE }),
        ),
    };

    if retriable {
        (status, [(header::RETRY_AFTER, "1")], Json(payload)).into_response()
    } else {
        (status, Json(payload)).into_response()
    }
}
