use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, Utc};
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::domain::{FieldValue, ScoreSheet, StudentId, StudentRecord, Submission};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;
/// Student ids may carry the current year or either of the two before it.
pub const STUDENT_ID_YEAR_WINDOW: i32 = 2;

#[derive(Debug, Clone, Copy)]
struct Field {
    name: &'static str,
    label: &'static str,
}

const STUDENT_ID: Field = Field {
    name: "studentId",
    label: "Student ID",
};
const BORN_DATE: Field = Field {
    name: "bornDate",
    label: "Year of birth",
};
const FIRST_NAME: Field = Field {
    name: "firstName",
    label: "First name",
};
const LAST_NAME: Field = Field {
    name: "lastName",
    label: "Last name",
};
const ASSIGNMENT1: Field = Field {
    name: "assignment1",
    label: "First Assignment score",
};
const ASSIGNMENT2: Field = Field {
    name: "assignment2",
    label: "Second Assignment score",
};
const ASSIGNMENT3: Field = Field {
    name: "assignment3",
    label: "Third Assignment score",
};
const MIDTERM1: Field = Field {
    name: "midterm1",
    label: "First Midterm score",
};
const MIDTERM2: Field = Field {
    name: "midterm2",
    label: "Second Midterm score",
};
const FINAL_EXAM: Field = Field {
    name: "final",
    label: "Final Exam score",
};

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldErrorKind {
    #[error("is required")]
    Missing,
    #[error("must be text or a number")]
    UnsupportedType,
    #[error("must be a number")]
    NotNumeric,
    #[error("must be between {min} and {max}")]
    OutOfRange { min: f64, max: f64 },
    #[error("Student ID must be in the format: YYYYAB1234")]
    MalformedStudentId,
    #[error("Year must be between {earliest} and {latest}")]
    StudentIdYearOutOfWindow { earliest: i32, latest: i32 },
}

impl FieldErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            FieldErrorKind::Missing => "missing",
            FieldErrorKind::UnsupportedType => "unsupported_type",
            FieldErrorKind::NotNumeric => "not_numeric",
            FieldErrorKind::OutOfRange { .. } => "out_of_range",
            FieldErrorKind::MalformedStudentId => "malformed_student_id",
            FieldErrorKind::StudentIdYearOutOfWindow { .. } => "student_id_year_out_of_window",
        }
    }
}

/// A violation attributed to one wire field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: FieldErrorKind,
    label: &'static str,
}

impl FieldError {
    fn new(field: Field, kind: FieldErrorKind) -> Self {
        Self {
            field: field.name,
            kind,
            label: field.label,
        }
    }

    pub fn message(&self) -> String {
        match &self.kind {
            FieldErrorKind::MalformedStudentId | FieldErrorKind::StudentIdYearOutOfWindow { .. } => {
                self.kind.to_string()
            }
            kind => format!("{} {}", self.label, kind),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message())
    }
}

impl std::error::Error for FieldError {}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FieldError", 3)?;
        state.serialize_field("field", self.field)?;
        state.serialize_field("code", self.kind.code())?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}

/// Every violation found in one submission, in wire field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    fn push(&mut self, field: Field, kind: FieldErrorKind) {
        self.0.push(FieldError::new(field, kind));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First error reported for the given wire field.
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|error| error.field == field)
    }
}

/// A submission that passed every rule; its scores are all within 0-100.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub student_id: StudentId,
    pub born_date: String,
    pub first_name: String,
    pub last_name: String,
    pub scores: ScoreSheet,
}

impl ValidatedSubmission {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn into_record(self, gpa: f64) -> StudentRecord {
        let full_name = self.full_name();
        StudentRecord {
            student_id: self.student_id,
            born_date: self.born_date,
            full_name,
            scores: self.scores,
            gpa,
        }
    }
}

/// Checks raw submissions against the structural, range, and student id rules.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionValidator {
    reference_year: i32,
}

impl SubmissionValidator {
    /// Validator whose student id window ends at `reference_year`.
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Validator anchored on the current UTC calendar year.
    pub fn current() -> Self {
        Self::new(Utc::now().year())
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Accumulates every violation instead of stopping at the first one.
    pub fn validate(&self, submission: &Submission) -> Result<ValidatedSubmission, FieldErrors> {
        let mut errors = FieldErrors::default();

        let student_id = self.student_id(submission.student_id.as_ref(), &mut errors);
        let born_date = required_text(BORN_DATE, submission.born_date.as_ref(), &mut errors);
        let first_name = required_text(FIRST_NAME, submission.first_name.as_ref(), &mut errors);
        let last_name = required_text(LAST_NAME, submission.last_name.as_ref(), &mut errors);
        let assignment1 = score(ASSIGNMENT1, submission.assignment1.as_ref(), &mut errors);
        let assignment2 = score(ASSIGNMENT2, submission.assignment2.as_ref(), &mut errors);
        let assignment3 = score(ASSIGNMENT3, submission.assignment3.as_ref(), &mut errors);
        let midterm1 = score(MIDTERM1, submission.midterm1.as_ref(), &mut errors);
        let midterm2 = score(MIDTERM2, submission.midterm2.as_ref(), &mut errors);
        let final_exam = score(FINAL_EXAM, submission.final_exam.as_ref(), &mut errors);

        // Each helper returns `None` exactly when it recorded an error.
        let (
            Some(student_id),
            Some(born_date),
            Some(first_name),
            Some(last_name),
            Some(assignment1),
            Some(assignment2),
            Some(assignment3),
            Some(midterm1),
            Some(midterm2),
            Some(final_exam),
        ) = (
            student_id,
            born_date,
            first_name,
            last_name,
            assignment1,
            assignment2,
            assignment3,
            midterm1,
            midterm2,
            final_exam,
        )
        else {
            return Err(errors);
        };

        Ok(ValidatedSubmission {
            student_id,
            born_date,
            first_name,
            last_name,
            scores: ScoreSheet {
                assignment1,
                assignment2,
                assignment3,
                midterm1,
                midterm2,
                final_exam,
            },
        })
    }

    fn student_id(&self, value: Option<&FieldValue>, errors: &mut FieldErrors) -> Option<StudentId> {
        let raw = required_text(STUDENT_ID, value, errors)?;

        let year = student_id_pattern()
            .captures(&raw)
            .and_then(|captures| captures.get(1))
            .and_then(|year| year.as_str().parse::<i32>().ok());
        let Some(year) = year else {
            errors.push(STUDENT_ID, FieldErrorKind::MalformedStudentId);
            return None;
        };

        let earliest = self.reference_year - STUDENT_ID_YEAR_WINDOW;
        let latest = self.reference_year;
        if !(earliest..=latest).contains(&year) {
            errors.push(
                STUDENT_ID,
                FieldErrorKind::StudentIdYearOutOfWindow { earliest, latest },
            );
            return None;
        }

        Some(StudentId(raw))
    }
}

fn student_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]{4})[A-Z]{2}[0-9]{4}$").expect("student id pattern compiles")
    })
}

fn required_text(field: Field, value: Option<&FieldValue>, errors: &mut FieldErrors) -> Option<String> {
    let value = match value {
        Some(value) if !value.is_blank() => value,
        _ => {
            errors.push(field, FieldErrorKind::Missing);
            return None;
        }
    };

    match value.as_text() {
        Some(text) => Some(text.into_owned()),
        None => {
            errors.push(field, FieldErrorKind::UnsupportedType);
            None
        }
    }
}

fn score(field: Field, value: Option<&FieldValue>, errors: &mut FieldErrors) -> Option<f64> {
    let parsed = match value {
        None => None,
        Some(value) if value.is_blank() => None,
        Some(FieldValue::Number(number)) => Some(Ok(*number)),
        Some(FieldValue::Text(text)) => Some(text.trim().parse::<f64>().map_err(|_| ())),
        Some(FieldValue::Other(_)) => Some(Err(())),
    };

    let number = match parsed {
        None => {
            errors.push(field, FieldErrorKind::Missing);
            return None;
        }
        Some(Ok(number)) if number.is_finite() => number,
        Some(_) => {
            errors.push(field, FieldErrorKind::NotNumeric);
            return None;
        }
    };

    if !(MIN_SCORE..=MAX_SCORE).contains(&number) {
        errors.push(
            field,
            FieldErrorKind::OutOfRange {
                min: MIN_SCORE,
                max: MAX_SCORE,
            },
        );
        return None;
    }

    Some(number)
}
