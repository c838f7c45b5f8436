pub mod calculator;
pub mod comparator;
pub mod config;
pub mod validation;

pub use calculator::{statistics, ExamScore, QuestionResult, ScoreCalculator};
pub use comparator::AnswerComparator;
pub use config::*;
pub use validation::{validate_detection, validate_grading};
