//! One-time coursework submissions with a weighted GPA and an exactly-once record store.

pub mod config;
pub mod error;
pub mod submissions;
pub mod telemetry;
