use crate::infra::open_store;
use clap::Args;
use gradebook::config::AppConfig;
use gradebook::error::AppError;
use gradebook::submissions::validation::{MAX_SCORE, MIN_SCORE};
use gradebook::submissions::{compute_gpa, ScoreSheet, StudentId};

#[derive(Args, Debug)]
pub(crate) struct GpaArgs {
    /// First assignment score (0-100)
    #[arg(long, value_parser = parse_score)]
    pub(crate) assignment1: f64,
    /// Second assignment score (0-100)
    #[arg(long, value_parser = parse_score)]
    pub(crate) assignment2: f64,
    /// Third assignment score (0-100)
    #[arg(long, value_parser = parse_score)]
    pub(crate) assignment3: f64,
    /// First midterm score (0-100)
    #[arg(long, value_parser = parse_score)]
    pub(crate) midterm1: f64,
    /// Second midterm score (0-100)
    #[arg(long, value_parser = parse_score)]
    pub(crate) midterm2: f64,
    /// Final exam score (0-100)
    #[arg(long = "final", value_parser = parse_score)]
    pub(crate) final_exam: f64,
}

impl From<&GpaArgs> for ScoreSheet {
    fn from(args: &GpaArgs) -> Self {
        ScoreSheet {
            assignment1: args.assignment1,
            assignment2: args.assignment2,
            assignment3: args.assignment3,
            midterm1: args.midterm1,
            midterm2: args.midterm2,
            final_exam: args.final_exam,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ShowArgs {
    /// Student identifier, e.g. 2025AB1234
    pub(crate) student_id: String,
}

pub(crate) fn parse_score(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
        Ok(value)
    } else {
        Err(format!("'{raw}' must be between {MIN_SCORE} and {MAX_SCORE}"))
    }
}

pub(crate) fn run_gpa(args: GpaArgs) -> Result<(), AppError> {
    let scores = ScoreSheet::from(&args);
    println!("Weighted GPA: {:.2}", compute_gpa(&scores));
    Ok(())
}

pub(crate) fn run_show(args: ShowArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = open_store(&config.store)?;
    let id = StudentId(args.student_id);

    match store.fetch(&id)? {
        Some(record) => {
            let rendered = serde_json::to_string_pretty(&record).map_err(std::io::Error::from)?;
            println!("{rendered}");
        }
        None => println!("No submission found for student ID {id}"),
    }
    Ok(())
}
