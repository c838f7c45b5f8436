use super::comparator::AnswerComparator;
use super::config::GradingConfig;
use crate::answer_key::{Answer, AnswerKey, QuestionKind};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const DEFAULT_POINTS_PER_QUESTION: f64 = 1.0;
const DEFAULT_PARTIAL_CREDIT_THRESHOLD: f64 = 0.7;

/// Outcome of grading a single question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_number: i32,
    pub is_correct: bool,
    /// `None` when the sheet had no answer for this question
    pub student_answer: Option<Answer>,
    pub correct_answer: Answer,
    /// Fraction of the question's points earned, 0.0 to 1.0
    pub partial_credit: f64,
}

/// Aggregate result of grading one sheet.
///
/// Partially credited answers are counted in neither `correct_answers` nor
/// `incorrect_answers`, so the three counters can sum to less than
/// `total_questions`. Their credit still reaches `raw_score`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExamScore {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub unanswered: usize,
    pub raw_score: f64,
    pub percentage_score: f64,
    pub question_results: Vec<QuestionResult>,
}

impl ExamScore {
    /// Questions that earned some but not full credit.
    pub fn partially_credited(&self) -> usize {
        self.question_results
            .iter()
            .filter(|r| !r.is_correct && r.partial_credit > 0.0)
            .count()
    }
}

/// Grades answer sets against a borrowed key.
#[derive(Debug, Clone)]
pub struct ScoreCalculator<'a> {
    answer_key: &'a AnswerKey,
    comparator: &'a AnswerComparator,
    points_per_question: f64,
    custom_points: HashMap<i32, f64>,
    partial_credit_enabled: bool,
    partial_credit_threshold: f64,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(answer_key: &'a AnswerKey, comparator: &'a AnswerComparator) -> Self {
        Self {
            answer_key,
            comparator,
            points_per_question: DEFAULT_POINTS_PER_QUESTION,
            custom_points: HashMap::new(),
            partial_credit_enabled: true,
            partial_credit_threshold: DEFAULT_PARTIAL_CREDIT_THRESHOLD,
        }
    }

    /// Build a calculator and apply `config` through the regular setters.
    /// Invalid values are ignored the same way the setters ignore them;
    /// run [`super::validate_grading`] first to reject them instead.
    pub fn from_config(
        answer_key: &'a AnswerKey,
        comparator: &'a AnswerComparator,
        config: &GradingConfig,
    ) -> Self {
        let mut calculator = Self::new(answer_key, comparator);

        if let Some(points) = config.points_per_question {
            calculator.set_points_per_question(points);
        }
        if let Some(ref overrides) = config.question_points {
            for (&question_number, &points) in overrides {
                calculator.set_question_points(question_number, points);
            }
        }
        if let Some(enabled) = config.partial_credit {
            calculator.set_partial_credit_enabled(enabled);
        }
        if let Some(threshold) = config.partial_credit_threshold {
            calculator.set_partial_credit_threshold(threshold);
        }

        calculator
    }

    /// Ignored unless `points > 0`.
    pub fn set_points_per_question(&mut self, points: f64) {
        if points > 0.0 {
            self.points_per_question = points;
        }
    }

    /// Ignored unless `points > 0`.
    pub fn set_question_points(&mut self, question_number: i32, points: f64) {
        if points > 0.0 {
            self.custom_points.insert(question_number, points);
        }
    }

    pub fn set_partial_credit_enabled(&mut self, enable: bool) {
        self.partial_credit_enabled = enable;
    }

    /// Ignored unless `threshold` is within [0, 1].
    pub fn set_partial_credit_threshold(&mut self, threshold: f64) {
        if (0.0..=1.0).contains(&threshold) {
            self.partial_credit_threshold = threshold;
        }
    }

    pub fn partial_credit_enabled(&self) -> bool {
        self.partial_credit_enabled
    }

    pub fn partial_credit_threshold(&self) -> f64 {
        self.partial_credit_threshold
    }

    /// Weight of a question: its override if set, the default otherwise.
    pub fn question_points(&self, question_number: i32) -> f64 {
        self.custom_points
            .get(&question_number)
            .copied()
            .unwrap_or(self.points_per_question)
    }

    fn partial_credit(&self, student: &Answer, correct: &Answer) -> f64 {
        if !self.partial_credit_enabled || student.kind != QuestionKind::FillInBlank {
            return 0.0;
        }

        let similarity = self
            .comparator
            .text_similarity(&student.text_answer, &correct.text_answer);

        if similarity >= self.partial_credit_threshold {
            similarity
        } else {
            0.0
        }
    }

    /// Grade `student_answers` against the key.
    ///
    /// Questions are visited from 1 to the number of questions in the key,
    /// skipping numbers the key lacks. If a question number appears more than
    /// once in `student_answers`, the last one counts.
    pub fn calculate_score(&self, student_answers: &[Answer]) -> ExamScore {
        let total_questions = self.answer_key.total_questions();
        let mut score = ExamScore {
            total_questions,
            ..Default::default()
        };

        let by_question: HashMap<i32, &Answer> = student_answers
            .iter()
            .map(|a| (a.question_number, a))
            .collect();

        let mut max_score = 0.0;

        for question_number in 1..=total_questions as i32 {
            let Some(correct) = self.answer_key.get(question_number) else {
                continue;
            };

            let mut result = QuestionResult {
                question_number,
                is_correct: false,
                student_answer: None,
                correct_answer: correct.clone(),
                partial_credit: 0.0,
            };

            match by_question.get(&question_number) {
                None => score.unanswered += 1,
                Some(student) => {
                    result.student_answer = Some((*student).clone());
                    result.is_correct = self.comparator.compare_answer(student, correct);

                    if result.is_correct {
                        result.partial_credit = 1.0;
                        score.correct_answers += 1;
                    } else {
                        result.partial_credit = self.partial_credit(student, correct);
                        // Partial credit counts toward neither correct nor incorrect
                        if result.partial_credit == 0.0 {
                            score.incorrect_answers += 1;
                        }
                    }
                }
            }

            let points = self.question_points(question_number);
            score.raw_score += points * result.partial_credit;
            max_score += points;

            score.question_results.push(result);
        }

        if max_score > 0.0 {
            score.percentage_score = score.raw_score / max_score * 100.0;
        }

        debug!(
            correct = score.correct_answers,
            incorrect = score.incorrect_answers,
            unanswered = score.unanswered,
            "graded {} questions, raw score {:.2}",
            score.question_results.len(),
            score.raw_score
        );

        score
    }

    /// Named summary figures for a graded sheet.
    pub fn statistics(&self, score: &ExamScore) -> BTreeMap<&'static str, f64> {
        statistics(score)
    }
}

pub const STAT_TOTAL_QUESTIONS: &str = "Total Questions";
pub const STAT_CORRECT: &str = "Correct Answers";
pub const STAT_INCORRECT: &str = "Incorrect Answers";
pub const STAT_UNANSWERED: &str = "Unanswered";
pub const STAT_RAW_SCORE: &str = "Raw Score";
pub const STAT_PERCENTAGE: &str = "Percentage";
pub const STAT_ACCURACY_RATE: &str = "Accuracy Rate";

/// Named summary figures for a graded sheet.
///
/// Accuracy rate is correct answers over answered questions, as a percentage.
pub fn statistics(score: &ExamScore) -> BTreeMap<&'static str, f64> {
    let mut stats = BTreeMap::new();

    stats.insert(STAT_TOTAL_QUESTIONS, score.total_questions as f64);
    stats.insert(STAT_CORRECT, score.correct_answers as f64);
    stats.insert(STAT_INCORRECT, score.incorrect_answers as f64);
    stats.insert(STAT_UNANSWERED, score.unanswered as f64);
    stats.insert(STAT_RAW_SCORE, score.raw_score);
    stats.insert(STAT_PERCENTAGE, score.percentage_score);

    let answered = score.total_questions.saturating_sub(score.unanswered);
    let accuracy = if answered > 0 {
        score.correct_answers as f64 / answered as f64 * 100.0
    } else {
        0.0
    };
    stats.insert(STAT_ACCURACY_RATE, accuracy);

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scenario_key() -> AnswerKey {
        let mut key = AnswerKey::new();
        key.add_multiple_choice_answer(1, 2);
        key.add_fill_in_blank_answer(2, "Ankara");
        key.add_true_false_answer(3, true);
        key
    }

    #[test]
    fn test_scenario_partial_credit_and_unanswered() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        let answers = vec![
            Answer::multiple_choice(1, Some(2)),
            Answer::fill_in_blank(2, "ankar"),
        ];
        let score = calculator.calculate_score(&answers);

        assert_eq!(score.total_questions, 3);
        assert_eq!(score.correct_answers, 1);
        assert_eq!(score.incorrect_answers, 0);
        assert_eq!(score.unanswered, 1);
        assert_eq!(score.partially_credited(), 1);

        let expected_credit = 1.0 - 1.0 / 6.0;
        assert!((score.question_results[1].partial_credit - expected_credit).abs() < 1e-9);
        assert!(!score.question_results[1].is_correct);
        assert!((score.raw_score - (1.0 + expected_credit)).abs() < 1e-9);
        assert!((score.percentage_score - 61.11).abs() < 0.01);

        assert!(score.question_results[2].student_answer.is_none());
        assert_eq!(score.question_results[2].partial_credit, 0.0);
    }

    #[test]
    fn test_all_correct() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        let answers = vec![
            Answer::multiple_choice(1, Some(2)),
            Answer::fill_in_blank(2, " ANKARA "),
            Answer::true_false(3, Some(0)),
        ];
        let score = calculator.calculate_score(&answers);

        assert_eq!(score.correct_answers, 3);
        assert_eq!(score.raw_score, 3.0);
        assert_eq!(score.percentage_score, 100.0);
        assert!(score.question_results.iter().all(|r| r.is_correct && r.partial_credit == 1.0));
    }

    #[test]
    fn test_no_selection_counts_incorrect() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        let answers = vec![
            Answer::multiple_choice(1, None),
            Answer::fill_in_blank(2, ""),
            Answer::true_false(3, None),
        ];
        let score = calculator.calculate_score(&answers);

        assert_eq!(score.correct_answers, 0);
        assert_eq!(score.incorrect_answers, 3);
        assert_eq!(score.unanswered, 0);
        assert_eq!(score.raw_score, 0.0);
    }

    #[test]
    fn test_partial_credit_disabled() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let mut calculator = ScoreCalculator::new(&key, &comparator);
        calculator.set_partial_credit_enabled(false);

        let score = calculator.calculate_score(&[Answer::fill_in_blank(2, "ankar")]);
        assert_eq!(score.incorrect_answers, 1);
        assert_eq!(score.question_results[1].partial_credit, 0.0);
    }

    #[test]
    fn test_partial_credit_only_for_fill_in_blank() {
        let mut key = AnswerKey::new();
        key.add_multiple_choice_answer(1, 2);
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        let score = calculator.calculate_score(&[Answer::multiple_choice(1, Some(3))]);
        assert_eq!(score.incorrect_answers, 1);
        assert_eq!(score.raw_score, 0.0);
    }

    #[test]
    fn test_partial_credit_threshold_boundary() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let similarity = comparator.text_similarity("ankar", "Ankara");

        let mut at_threshold = ScoreCalculator::new(&key, &comparator);
        at_threshold.set_partial_credit_threshold(similarity);
        let score = at_threshold.calculate_score(&[Answer::fill_in_blank(2, "ankar")]);
        assert_eq!(score.question_results[1].partial_credit, similarity);
        assert_eq!(score.incorrect_answers, 0);

        // Similarity one ulp below the threshold earns nothing
        let just_above = f64::from_bits(similarity.to_bits() + 1);
        let mut above_threshold = ScoreCalculator::new(&key, &comparator);
        above_threshold.set_partial_credit_threshold(just_above);
        let score = above_threshold.calculate_score(&[Answer::fill_in_blank(2, "ankar")]);
        assert_eq!(score.question_results[1].partial_credit, 0.0);
        assert_eq!(score.incorrect_answers, 1);
    }

    #[test]
    fn test_below_threshold_is_incorrect() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        // "izmir" vs "ankara" shares almost nothing
        let score = calculator.calculate_score(&[Answer::fill_in_blank(2, "izmir")]);
        assert_eq!(score.incorrect_answers, 1);
        assert_eq!(score.question_results[1].partial_credit, 0.0);
    }

    #[test]
    fn test_weights_and_overrides() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let mut calculator = ScoreCalculator::new(&key, &comparator);
        calculator.set_points_per_question(2.0);
        calculator.set_question_points(3, 6.0);

        assert_eq!(calculator.question_points(1), 2.0);
        assert_eq!(calculator.question_points(3), 6.0);

        let answers = vec![
            Answer::multiple_choice(1, Some(2)),
            Answer::true_false(3, Some(0)),
        ];
        let score = calculator.calculate_score(&answers);

        // 2 + 6 earned out of 2 + 2 + 6
        assert_eq!(score.raw_score, 8.0);
        assert!((score.percentage_score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_settings_ignored() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let mut calculator = ScoreCalculator::new(&key, &comparator);

        calculator.set_points_per_question(0.0);
        calculator.set_points_per_question(-3.0);
        calculator.set_question_points(1, 0.0);
        calculator.set_partial_credit_threshold(1.2);
        calculator.set_partial_credit_threshold(-0.1);
        calculator.set_partial_credit_threshold(f64::NAN);

        assert_eq!(calculator.question_points(1), 1.0);
        assert_eq!(calculator.partial_credit_threshold(), 0.7);
    }

    #[test]
    fn test_key_gaps_skipped() {
        // Key numbers 1, 2 and 5: only 1..=3 are visited, so 5 is never graded
        let mut key = AnswerKey::new();
        key.add_multiple_choice_answer(1, 0);
        key.add_multiple_choice_answer(2, 1);
        key.add_multiple_choice_answer(5, 2);
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        let answers = vec![
            Answer::multiple_choice(1, Some(0)),
            Answer::multiple_choice(2, Some(1)),
            Answer::multiple_choice(5, Some(2)),
        ];
        let score = calculator.calculate_score(&answers);

        assert_eq!(score.total_questions, 3);
        assert_eq!(score.question_results.len(), 2);
        assert_eq!(score.correct_answers, 2);
        assert_eq!(score.percentage_score, 100.0);
    }

    #[test]
    fn test_empty_key() {
        let key = AnswerKey::new();
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        let score = calculator.calculate_score(&[Answer::multiple_choice(1, Some(0))]);
        assert_eq!(score.total_questions, 0);
        assert_eq!(score.percentage_score, 0.0);
        assert!(score.question_results.is_empty());
    }

    #[test]
    fn test_last_duplicate_answer_wins() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        let answers = vec![
            Answer::multiple_choice(1, Some(0)),
            Answer::multiple_choice(1, Some(2)),
        ];
        let score = calculator.calculate_score(&answers);
        assert!(score.question_results[0].is_correct);
    }

    #[test]
    fn test_calculate_score_idempotent() {
        let key = AnswerKey::sample();
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        let answers = vec![
            Answer::multiple_choice(1, Some(2)),
            Answer::multiple_choice(2, Some(1)),
            Answer::fill_in_blank(11, "istanbul"),
            Answer::fill_in_blank(14, "Mustafa Kema"),
            Answer::true_false(16, Some(0)),
        ];

        let first = calculator.calculate_score(&answers);
        let second = calculator.calculate_score(&answers);
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_config() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let config = GradingConfig {
            case_sensitive: None,
            points_per_question: Some(2.0),
            question_points: Some(BTreeMap::from([(2, 4.0), (3, -1.0)])),
            partial_credit: Some(false),
            partial_credit_threshold: Some(3.0),
        };

        let calculator = ScoreCalculator::from_config(&key, &comparator, &config);
        assert_eq!(calculator.question_points(1), 2.0);
        assert_eq!(calculator.question_points(2), 4.0);
        assert_eq!(calculator.question_points(3), 2.0);
        assert!(!calculator.partial_credit_enabled());
        assert_eq!(calculator.partial_credit_threshold(), 0.7);
    }

    #[test]
    fn test_statistics() {
        let key = scenario_key();
        let comparator = AnswerComparator::default();
        let calculator = ScoreCalculator::new(&key, &comparator);

        let answers = vec![
            Answer::multiple_choice(1, Some(2)),
            Answer::fill_in_blank(2, "Izmir"),
        ];
        let score = calculator.calculate_score(&answers);
        let stats = calculator.statistics(&score);

        assert_eq!(stats.len(), 7);
        assert_eq!(stats[STAT_TOTAL_QUESTIONS], 3.0);
        assert_eq!(stats[STAT_CORRECT], 1.0);
        assert_eq!(stats[STAT_INCORRECT], 1.0);
        assert_eq!(stats[STAT_UNANSWERED], 1.0);
        assert_eq!(stats[STAT_RAW_SCORE], 1.0);
        // 1 correct out of 2 answered
        assert!((stats[STAT_ACCURACY_RATE] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_statistics_nothing_answered() {
        let score = ExamScore {
            total_questions: 4,
            unanswered: 4,
            ..Default::default()
        };
        assert_eq!(statistics(&score)[STAT_ACCURACY_RATE], 0.0);
    }
}
