use super::domain::ScoreSheet;

const ASSIGNMENT_WEIGHT: f64 = 0.30;
const MIDTERM_WEIGHT: f64 = 0.40;
const FINAL_WEIGHT: f64 = 0.30;
/// A 100-point weighted score divided by this lands on the 4.0 scale.
const POINTS_PER_GRADE_POINT: f64 = 25.0;

/// Weighted GPA on the 0.00-4.00 scale, rounded half away from zero to two decimals.
///
/// Scores are expected on the 0-100 scale; the validator guarantees this before a sheet
/// reaches here.
pub fn compute_gpa(scores: &ScoreSheet) -> f64 {
    let assignments = (scores.assignment1 + scores.assignment2 + scores.assignment3) / 3.0;
    let midterms = (scores.midterm1 + scores.midterm2) / 2.0;
    let weighted = assignments * ASSIGNMENT_WEIGHT
        + midterms * MIDTERM_WEIGHT
        + scores.final_exam * FINAL_WEIGHT;

    round_to_hundredths(weighted / POINTS_PER_GRADE_POINT)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
