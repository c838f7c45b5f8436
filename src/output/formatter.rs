use std::collections::BTreeMap;
use std::io::IsTerminal;

use owo_colors::OwoColorize;

use crate::answer_key::{Answer, QuestionKind};
use crate::grading::calculator::{
    STAT_ACCURACY_RATE, STAT_CORRECT, STAT_INCORRECT, STAT_PERCENTAGE, STAT_RAW_SCORE,
    STAT_TOTAL_QUESTIONS, STAT_UNANSWERED,
};
use crate::grading::{ExamScore, QuestionResult};

const RULE_WIDTH: usize = 50;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Human-readable form of an answer: option letter, True/False, or quoted text.
pub fn format_answer(answer: &Answer) -> String {
    match answer.kind {
        QuestionKind::MultipleChoice => match answer.selected_option {
            Some(idx) if idx < 26 => ((b'A' + idx as u8) as char).to_string(),
            Some(idx) => format!("#{}", idx),
            None => "-".to_string(),
        },
        QuestionKind::TrueFalse => match answer.selected_option {
            Some(0) => "True".to_string(),
            Some(_) => "False".to_string(),
            None => "-".to_string(),
        },
        QuestionKind::FillInBlank => format!("\"{}\"", answer.text_answer),
    }
}

/// Headline block: counters, raw score and percentage.
pub fn format_score_summary(title: &str, score: &ExamScore, use_colors: bool) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let thin_rule = "-".repeat(RULE_WIDTH);
    let percentage = format!("{:.2}%", score.percentage_score);

    let mut lines = vec![rule.clone()];
    if use_colors {
        lines.push(format!("{}", title.bold()));
    } else {
        lines.push(title.to_string());
    }
    lines.push(rule.clone());
    lines.push(format!("Total questions:   {}", score.total_questions));
    lines.push(format!("Correct:           {}", score.correct_answers));
    lines.push(format!("Incorrect:         {}", score.incorrect_answers));
    lines.push(format!("Unanswered:        {}", score.unanswered));

    let partial = score.partially_credited();
    if partial > 0 {
        lines.push(format!("Partial credit:    {}", partial));
    }

    lines.push(thin_rule);
    lines.push(format!("Raw score:         {:.2}", score.raw_score));
    if use_colors {
        lines.push(format!("Percentage:        {}", percentage.bold()));
    } else {
        lines.push(format!("Percentage:        {}", percentage));
    }
    lines.push(rule);

    lines.join("\n")
}

fn format_result_line(result: &QuestionResult, use_colors: bool) -> String {
    let verdict = if result.is_correct {
        "correct".to_string()
    } else if result.partial_credit > 0.0 {
        format!("partial ({:.0}%)", result.partial_credit * 100.0)
    } else if result.student_answer.is_none() {
        "unanswered".to_string()
    } else {
        "incorrect".to_string()
    };

    let verdict = if !use_colors {
        verdict
    } else if result.is_correct {
        verdict.green().to_string()
    } else if result.partial_credit > 0.0 {
        verdict.yellow().to_string()
    } else {
        verdict.red().to_string()
    };

    let given = result
        .student_answer
        .as_ref()
        .map(format_answer)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "Q{:>3}  {:<16}  given: {}  expected: {}",
        result.question_number,
        verdict,
        given,
        format_answer(&result.correct_answer)
    )
}

/// One line per graded question.
pub fn format_question_results(score: &ExamScore, use_colors: bool) -> String {
    if score.question_results.is_empty() {
        return "No questions graded.".to_string();
    }

    score
        .question_results
        .iter()
        .map(|result| format_result_line(result, use_colors))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Statistics mapping in a fixed, readable order.
pub fn format_statistics(stats: &BTreeMap<&'static str, f64>) -> String {
    let counts = [STAT_TOTAL_QUESTIONS, STAT_CORRECT, STAT_INCORRECT, STAT_UNANSWERED];
    let mut lines = Vec::new();

    for name in counts {
        if let Some(value) = stats.get(name) {
            lines.push(format!("{:<18} {:.0}", format!("{}:", name), value));
        }
    }
    if let Some(value) = stats.get(STAT_RAW_SCORE) {
        lines.push(format!("{:<18} {:.2}", format!("{}:", STAT_RAW_SCORE), value));
    }
    for name in [STAT_PERCENTAGE, STAT_ACCURACY_RATE] {
        if let Some(value) = stats.get(name) {
            lines.push(format!("{:<18} {:.2}%", format!("{}:", name), value));
        }
    }

    lines.join("\n")
}
