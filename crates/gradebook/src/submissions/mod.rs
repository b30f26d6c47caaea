//! Coursework submission intake: validation, GPA scoring, and exactly-once persistence.
//!
//! A submission flows through [`SubmissionValidator`], then [`compute_gpa`], then a single
//! [`RecordStore::insert_if_absent`] call. The store's conditional insert is the only place
//! where "one record per student" is enforced; nothing here reads before writing.

pub mod domain;
pub mod gpa;
pub mod router;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{FieldValue, ScoreSheet, StudentId, StudentRecord, Submission};
pub use gpa::compute_gpa;
pub use router::submission_router;
pub use service::{SubmissionError, SubmissionService};
pub use store::{InsertOutcome, MemoryRecordStore, RecordStore, SqliteRecordStore, StoreError};
pub use validation::{
    FieldError, FieldErrorKind, FieldErrors, SubmissionValidator, ValidatedSubmission,
};
