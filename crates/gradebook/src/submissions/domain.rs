use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Student identifier, `YYYY` + two uppercase letters + four digits once validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A form value as the browser sent it; numeric inputs arrive either as JSON numbers or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    /// Trimmed textual form, `None` for values that are neither text nor numbers.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(text) => Some(Cow::Borrowed(text.trim())),
            FieldValue::Number(number) => Some(Cow::Owned(number.to_string())),
            FieldValue::Other(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Number(_) => false,
            FieldValue::Other(value) => value.is_null(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// Raw submission payload; every field is optional so missing ones surface as field errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born_date: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment1: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment2: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment3: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midterm1: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midterm2: Option<FieldValue>,
    #[serde(default, rename = "final", skip_serializing_if = "Option::is_none")]
    pub final_exam: Option<FieldValue>,
}

/// The six graded components on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSheet {
    pub assignment1: f64,
    pub assignment2: f64,
    pub assignment3: f64,
    pub midterm1: f64,
    pub midterm2: f64,
    #[serde(rename = "final")]
    pub final_exam: f64,
}

/// Persisted, immutable result of one student's submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub student_id: StudentId,
    pub born_date: String,
    pub full_name: String,
    #[serde(flatten)]
    pub scores: ScoreSheet,
    pub gpa: f64,
}
