// State of one pass through a quiz.

use std::collections::{BTreeMap, HashMap};

use super::content::{Question, QuestionKey};
use super::scoring::{score_quiz, QuizResult};

/// Questions, the current position and the user's selections for a single
/// attempt. Selections are option positions and live only as long as the
/// attempt; only the final score leaves the client.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    quiz_id: i64,
    title: String,
    questions: Vec<Question>,
    current: usize,
    selections: HashMap<QuestionKey, usize>,
}

impl QuizAttempt {
    pub fn new(quiz_id: i64, title: impl Into<String>, questions: Vec<Question>) -> Self {
        QuizAttempt {
            quiz_id,
            title: title.into(),
            questions,
            current: 0,
            selections: HashMap::new(),
        }
    }

    pub fn quiz_id(&self) -> i64 {
        self.quiz_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Zero-based position of the question on screen.
    pub fn position(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Record option `option` for the current question. Returns false when
    /// the position is out of range.
    pub fn select(&mut self, option: usize) -> bool {
        let Some(question) = self.questions.get(self.current) else {
            return false;
        };
        if option >= question.options.len() {
            return false;
        }
        self.selections.insert(question.key.clone(), option);
        true
    }

    /// Option selected for the current question.
    pub fn selected(&self) -> Option<usize> {
        let question = self.current_question()?;
        self.selections.get(&question.key).copied()
    }

    /// The current question must be answered before moving on or submitting.
    pub fn can_advance(&self) -> bool {
        self.selected().is_some()
    }

    pub fn is_last(&self) -> bool {
        !self.questions.is_empty() && self.current + 1 == self.questions.len()
    }

    /// Move to the next question. No-op on the last question or while the
    /// current one is unanswered.
    pub fn next(&mut self) -> bool {
        if self.is_last() || !self.can_advance() || self.questions.is_empty() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn back(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Progress through the quiz counting the question on screen, e.g. 50.0
    /// on question 1 of 2.
    pub fn progress_percent(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        (self.current + 1) as f64 / self.questions.len() as f64 * 100.0
    }

    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.selections.contains_key(&q.key))
            .count()
    }

    pub fn finish(&self) -> QuizResult {
        score_quiz(&self.questions, &self.selections)
    }

    /// Selections keyed by question key, in the shape the submit endpoint
    /// expects.
    pub fn answers_payload(&self) -> BTreeMap<String, usize> {
        self.selections
            .iter()
            .map(|(key, &option)| (key.as_str().to_string(), option))
            .collect()
    }
}
