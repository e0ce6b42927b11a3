// Client-side answer checking and score computation.

use std::collections::HashMap;

use serde_json::Value;

use super::content::{Question, QuestionKey};

const ANSWER_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Which rule accepted an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// The option carries `is_correct`/`correct: true`.
    Flagged,
    /// The option's text equals the answer text.
    Text,
    /// The answer is the option's zero-based position.
    Index,
    /// The answer is a letter A-F naming the option's position.
    Letter,
}

/// Decide whether option `selected` answers `question` correctly, returning
/// the first rule that accepts it.
///
/// Rules are tried in order: correctness flag, text, numeric index, letter.
/// A flag only ever accepts; `is_correct: false` falls through to the rest.
pub fn judge(question: &Question, selected: usize) -> Option<MatchRule> {
    let option = question.options.get(selected);

    if option.is_some_and(|o| o.flagged) {
        return Some(MatchRule::Flagged);
    }

    let answer = question.answer.as_ref().filter(|a| is_truthy(a));

    if let (Some(answer), Some(option)) = (answer, option) {
        if answer_text(answer).trim() == option.match_text.trim() {
            return Some(MatchRule::Text);
        }
    }

    if let Some(n) = question.answer.as_ref().and_then(answer_number) {
        if n >= 0.0 && n.fract() == 0.0 && n as usize == selected {
            return Some(MatchRule::Index);
        }
    }

    if let Some(letter) = answer.and_then(answer_letter) {
        if letter == selected {
            return Some(MatchRule::Letter);
        }
    }

    None
}

pub fn is_correct(question: &Question, selected: usize) -> bool {
    judge(question, selected).is_some()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn answer_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric reading of the answer: a JSON number or a string that parses
/// as one.
fn answer_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn answer_letter(value: &Value) -> Option<usize> {
    let s = value.as_str()?.trim();
    let mut chars = s.chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() {
        return None;
    }
    ANSWER_LETTERS.iter().position(|&l| l == c)
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizResult {
    /// Percentage in `0.0..=100.0`, unrounded.
    pub score: f64,
    pub correct_answers: usize,
    pub total_questions: usize,
}

impl QuizResult {
    /// Score rounded to one decimal for display, e.g. `"66.7"`.
    pub fn display_score(&self) -> String {
        format!("{:.1}", self.score)
    }
}

/// Score `questions` against `selections` (question key to option
/// position). Unanswered questions count as incorrect; an empty quiz
/// scores 0.
pub fn score_quiz(questions: &[Question], selections: &HashMap<QuestionKey, usize>) -> QuizResult {
    let correct_answers = questions
        .iter()
        .filter(|q| {
            selections
                .get(&q.key)
                .is_some_and(|&selected| is_correct(q, selected))
        })
        .count();
    let total_questions = questions.len();
    let score = if total_questions == 0 {
        0.0
    } else {
        correct_answers as f64 / total_questions as f64 * 100.0
    };
    QuizResult {
        score,
        correct_answers,
        total_questions,
    }
}
