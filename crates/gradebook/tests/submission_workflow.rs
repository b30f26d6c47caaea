//! End-to-end scenarios through the public service facade and the SQLite store.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use gradebook::submissions::{
    compute_gpa, InsertOutcome, RecordStore, ScoreSheet, SqliteRecordStore, StudentId,
    StudentRecord, Submission, SubmissionError, SubmissionService,
};
use serde_json::json;

const REFERENCE_YEAR: i32 = 2025;

fn submission(student_id: &str, final_exam: f64) -> Submission {
    serde_json::from_value(json!({
        "studentId": student_id,
        "bornDate": "2003",
        "firstName": "Alan",
        "lastName": "Turing",
        "assignment1": "90",
        "assignment2": "85",
        "assignment3": "95",
        "midterm1": "80",
        "midterm2": "88",
        "final": final_exam,
    }))
    .expect("submission deserializes")
}

fn record(student_id: &str, full_name: &str) -> StudentRecord {
    let scores = ScoreSheet {
        assignment1: 70.0,
        assignment2: 75.0,
        assignment3: 80.0,
        midterm1: 65.0,
        midterm2: 90.0,
        final_exam: 85.0,
    };
    StudentRecord {
        student_id: StudentId(student_id.to_string()),
        born_date: "2002".to_string(),
        full_name: full_name.to_string(),
        gpa: compute_gpa(&scores),
        scores,
    }
}

#[tokio::test]
async fn stored_record_round_trips_through_sqlite_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(
        SqliteRecordStore::open(dir.path().join("grades.db"), Duration::from_secs(1))
            .expect("store opens"),
    );
    let service = SubmissionService::new(store.clone(), Duration::from_secs(2))
        .with_reference_year(REFERENCE_YEAR);

    let stored = service
        .submit(submission("2024TU0042", 92.0))
        .await
        .expect("stored");
    assert_eq!(stored.gpa, 3.53);
    assert_eq!(stored.full_name, "Alan Turing");

    let fetched = service
        .lookup(&StudentId("2024TU0042".to_string()))
        .await
        .expect("lookup succeeds")
        .expect("record present");
    assert_eq!(fetched, stored);
    assert_eq!(fetched.scores.midterm2, 88.0);
    assert_eq!(fetched.gpa, compute_gpa(&fetched.scores));

    let duplicate = service
        .submit(submission("2024TU0042", 10.0))
        .await
        .expect_err("second submission refused");
    assert!(matches!(
        duplicate,
        SubmissionError::Duplicate { ref student_id } if student_id.as_str() == "2024TU0042"
    ));
}

#[test]
fn independent_connections_race_for_one_student() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("shared.db");
    let contenders = 8;

    let stores: Vec<_> = (0..contenders)
        .map(|_| SqliteRecordStore::open(&path, Duration::from_secs(5)).expect("store opens"))
        .collect();
    let barrier = Arc::new(Barrier::new(contenders));

    let handles: Vec<_> = stores
        .into_iter()
        .enumerate()
        .map(|(index, store)| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let candidate = record("2025RC0001", &format!("Contender {index}"));
                barrier.wait();
                let outcome = store
                    .insert_if_absent(&candidate)
                    .expect("insert reaches store");
                (outcome, candidate)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread completes"))
        .collect();

    let winners: Vec<_> = results
        .iter()
        .filter(|(outcome, _)| *outcome == InsertOutcome::Inserted)
        .collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|(outcome, _)| *outcome == InsertOutcome::AlreadyExists)
            .count(),
        contenders - 1
    );

    let reader = SqliteRecordStore::open(&path, Duration::from_secs(5)).expect("store opens");
    let stored = reader
        .fetch(&StudentId("2025RC0001".to_string()))
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored, winners[0].1);
}

#[tokio::test]
async fn validation_failures_never_reach_the_store() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(
        SqliteRecordStore::open(dir.path().join("grades.db"), Duration::from_secs(1))
            .expect("store opens"),
    );
    let service = SubmissionService::new(store.clone(), Duration::from_secs(2))
        .with_reference_year(REFERENCE_YEAR);

    let err = service
        .submit(submission("2019TU0042", 92.0))
        .await
        .expect_err("student id year outside window");
    let SubmissionError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.for_field("studentId").map(|error| error.message()),
        Some("Year must be between 2023 and 2025".to_string())
    );
    assert!(store
        .fetch(&StudentId("2019TU0042".to_string()))
        .expect("fetch succeeds")
        .is_none());
}
