// Quiz content parsing, answer checking and the in-progress attempt.

pub mod attempt;
pub mod content;
pub mod scoring;

pub use attempt::QuizAttempt;
pub use content::{parse_content, ContentError, Question, QuestionKey, QuizOption};
pub use scoring::{is_correct, judge, score_quiz, MatchRule, QuizResult};
