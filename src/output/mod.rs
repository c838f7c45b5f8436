pub mod formatter;

pub use formatter::{
    format_answer, format_question_results, format_score_summary, format_statistics,
    should_use_colors,
};
