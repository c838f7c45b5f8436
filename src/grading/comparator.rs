use crate::answer_key::{Answer, QuestionKind};

/// Decides whether a student answer matches a key answer.
#[derive(Debug, Clone, Default)]
pub struct AnswerComparator {
    case_sensitive: bool,
}

impl AnswerComparator {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    pub fn set_case_sensitive(&mut self, sensitive: bool) {
        self.case_sensitive = sensitive;
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn compare_multiple_choice(&self, student: Option<usize>, correct: Option<usize>) -> bool {
        student == correct
    }

    pub fn compare_true_false(&self, student: Option<usize>, correct: Option<usize>) -> bool {
        student == correct
    }

    pub fn compare_fill_in_blank(&self, student: &str, correct: &str) -> bool {
        self.normalize(student) == self.normalize(correct)
    }

    /// Single entry point used when grading. Answers to different questions,
    /// or of different kinds, never match.
    pub fn compare_answer(&self, student: &Answer, correct: &Answer) -> bool {
        if student.question_number != correct.question_number || student.kind != correct.kind {
            return false;
        }

        match correct.kind {
            QuestionKind::MultipleChoice => {
                self.compare_multiple_choice(student.selected_option, correct.selected_option)
            }
            QuestionKind::FillInBlank => {
                self.compare_fill_in_blank(&student.text_answer, &correct.text_answer)
            }
            QuestionKind::TrueFalse => {
                self.compare_true_false(student.selected_option, correct.selected_option)
            }
        }
    }

    /// Normalized Levenshtein similarity of two texts, in [0, 1].
    ///
    /// Both texts are normalized first. Two empty texts are identical (1.0);
    /// exactly one empty text shares nothing with the other (0.0).
    pub fn text_similarity(&self, text1: &str, text2: &str) -> f64 {
        let a: Vec<char> = self.normalize(text1).chars().collect();
        let b: Vec<char> = self.normalize(text2).chars().collect();

        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let distance = edit_distance(&a, &b);
        let max_len = a.len().max(b.len());

        (1.0 - distance as f64 / max_len as f64).max(0.0)
    }

    fn normalize(&self, text: &str) -> String {
        let trimmed = text.trim();
        if self.case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        }
    }
}

/// Unit-cost Levenshtein distance, computed row by row.
pub fn edit_distance(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1) // deletion
                .min(curr[j] + 1) // insertion
                .min(prev[j] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
