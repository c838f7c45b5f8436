use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of question an answer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    FillInBlank,
    TrueFalse,
}

impl QuestionKind {
    /// Token used for this kind in the answer key file.
    pub fn key_token(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "MC",
            QuestionKind::FillInBlank => "FILL",
            QuestionKind::TrueFalse => "TF",
        }
    }

    pub fn from_key_token(token: &str) -> Option<Self> {
        match token {
            "MC" => Some(QuestionKind::MultipleChoice),
            "FILL" => Some(QuestionKind::FillInBlank),
            "TF" => Some(QuestionKind::TrueFalse),
            _ => None,
        }
    }
}

/// One response unit, either read off a sheet or stored in a key.
///
/// `kind` decides which field carries the answer: bubble questions use
/// `selected_option` (`None` when nothing usable was marked), fill-in-blank
/// questions use `text_answer`. The unused field stays at its default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Answer {
    pub question_number: i32,
    pub kind: QuestionKind,
    pub selected_option: Option<usize>,
    pub text_answer: String,
}

impl Answer {
    pub fn multiple_choice(question_number: i32, selected_option: Option<usize>) -> Self {
        Self {
            question_number,
            kind: QuestionKind::MultipleChoice,
            selected_option,
            text_answer: String::new(),
        }
    }

    /// True/False answers use option 0 for "true" and 1 for "false".
    pub fn true_false(question_number: i32, selected_option: Option<usize>) -> Self {
        Self {
            question_number,
            kind: QuestionKind::TrueFalse,
            selected_option,
            text_answer: String::new(),
        }
    }

    pub fn fill_in_blank(question_number: i32, text: impl Into<String>) -> Self {
        Self {
            question_number,
            kind: QuestionKind::FillInBlank,
            selected_option: None,
            text_answer: text.into(),
        }
    }

    /// Option index in its persisted form, -1 meaning no selection.
    pub fn option_sentinel(&self) -> i64 {
        self.selected_option.map(|o| o as i64).unwrap_or(-1)
    }
}

/// Canonical answers keyed by question number, iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerKey {
    answers: BTreeMap<i32, Answer>,
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_multiple_choice_answer(&mut self, question_number: i32, correct_option: usize) {
        self.insert(Answer::multiple_choice(question_number, Some(correct_option)));
    }

    pub fn add_fill_in_blank_answer(&mut self, question_number: i32, correct_text: impl Into<String>) {
        self.insert(Answer::fill_in_blank(question_number, correct_text));
    }

    pub fn add_true_false_answer(&mut self, question_number: i32, is_true: bool) {
        let option = if is_true { 0 } else { 1 };
        self.insert(Answer::true_false(question_number, Some(option)));
    }

    /// Insert an answer, replacing whatever was stored for its question number.
    pub fn insert(&mut self, answer: Answer) {
        self.answers.insert(answer.question_number, answer);
    }

    /// Stored answer for the question, or the default empty answer if there is none.
    pub fn get_answer(&self, question_number: i32) -> Answer {
        self.answers
            .get(&question_number)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get(&self, question_number: i32) -> Option<&Answer> {
        self.answers.get(&question_number)
    }

    pub fn has_answer(&self, question_number: i32) -> bool {
        self.answers.contains_key(&question_number)
    }

    pub fn total_questions(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &Answer)> {
        self.answers.iter().map(|(q, a)| (*q, a))
    }

    /// The 20-question example key: multiple choice 1-10, fill-in-blank 11-15,
    /// true/false 16-20.
    pub fn sample() -> Self {
        let mut key = Self::new();

        for (q, option) in [2, 0, 3, 1, 4, 2, 0, 3, 1, 2].into_iter().enumerate() {
            key.add_multiple_choice_answer(q as i32 + 1, option);
        }

        let texts = ["Istanbul", "1923", "Ankara", "Mustafa Kemal", "Cumhuriyet"];
        for (q, text) in texts.into_iter().enumerate() {
            key.add_fill_in_blank_answer(q as i32 + 11, text);
        }

        for (q, is_true) in [true, false, true, true, false].into_iter().enumerate() {
            key.add_true_false_answer(q as i32 + 16, is_true);
        }

        key
    }
}
