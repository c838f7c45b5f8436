//! Exam sheet grading: answer extraction from scan measurements, answer key
//! storage, and scoring with weights and partial credit.

pub mod answer_key;
pub mod config;
pub mod detection;
pub mod grading;
pub mod output;
pub mod sheet;
