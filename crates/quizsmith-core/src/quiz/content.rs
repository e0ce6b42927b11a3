// Normalization of stored quiz content into question records.
//
// Quizzes come from several generation sources and the stored `content`
// is not shape-consistent: it may be a JSON string or an inline value, a
// bare list or a list wrapped in `questions`/`data`, and each question
// names its fields differently.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

const MISSING_QUESTION_TEXT: &str = "Question Text Missing";
const MISSING_OPTION_LABEL: &str = "Option";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("quiz content is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("malformed quiz content: {0}")]
    Malformed(String),
}

/// Identifies a question within an attempt: its `id` when present,
/// otherwise its position in the list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionKey(String);

impl QuestionKey {
    fn for_question(obj: &Map<String, Value>, index: usize) -> Self {
        match obj.get("id") {
            Some(Value::String(s)) => QuestionKey(s.clone()),
            Some(Value::Null) | None => QuestionKey(index.to_string()),
            Some(other) => QuestionKey(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionKey {
    fn from(s: &str) -> Self {
        QuestionKey(s.to_string())
    }
}

/// One answer choice.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizOption {
    /// Text shown to the user.
    pub label: String,
    /// Text compared against the question's answer. For object options
    /// only the `text` field counts.
    pub match_text: String,
    /// `is_correct: true` or `correct: true` on an object option.
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub key: QuestionKey,
    pub text: String,
    pub options: Vec<QuizOption>,
    /// Answer designator: a letter, an index or the correct option's text.
    pub answer: Option<Value>,
}

/// Parse stored quiz content into questions.
///
/// String content is decoded as JSON first. Null content yields an empty
/// list; callers decide how to present a quiz without questions.
pub fn parse_content(content: &Value) -> Result<Vec<Question>, ContentError> {
    let decoded;
    let value = match content {
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s)?;
            &decoded
        }
        other => other,
    };

    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(obj) => unwrap_question_list(obj)?,
        other => {
            return Err(ContentError::Malformed(format!(
                "expected a list of questions, found {}",
                type_name(other)
            )))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_question(item, index))
        .collect()
}

fn unwrap_question_list(obj: &Map<String, Value>) -> Result<&Vec<Value>, ContentError> {
    for field in ["questions", "data"] {
        match obj.get(field) {
            Some(Value::Array(items)) => return Ok(items),
            Some(Value::Null) | None => continue,
            Some(other) => {
                return Err(ContentError::Malformed(format!(
                    "`{field}` should be a list, found {}",
                    type_name(other)
                )))
            }
        }
    }
    Err(ContentError::Malformed(
        "object has neither `questions` nor `data`".into(),
    ))
}

fn parse_question(item: &Value, index: usize) -> Result<Question, ContentError> {
    let obj = item.as_object().ok_or_else(|| {
        ContentError::Malformed(format!(
            "question {} is {}, not an object",
            index + 1,
            type_name(item)
        ))
    })?;

    let text = ["text", "question", "question_text"]
        .iter()
        .find_map(|field| obj.get(*field).and_then(truthy_text))
        .unwrap_or_else(|| MISSING_QUESTION_TEXT.to_string());

    let options = match obj.get("options") {
        Some(Value::Array(opts)) => opts.iter().map(parse_option).collect(),
        _ => Vec::new(),
    };

    let answer = obj.get("answer").filter(|v| !v.is_null()).cloned();

    Ok(Question {
        key: QuestionKey::for_question(obj, index),
        text,
        options,
        answer,
    })
}

fn parse_option(value: &Value) -> QuizOption {
    match value {
        Value::String(s) => QuizOption {
            label: s.clone(),
            match_text: s.clone(),
            flagged: false,
        },
        Value::Object(obj) => {
            let label = ["text", "answer", "choice", "label", "value"]
                .iter()
                .find_map(|field| obj.get(*field).and_then(truthy_text))
                .unwrap_or_else(|| MISSING_OPTION_LABEL.to_string());
            let match_text = obj.get("text").and_then(truthy_text).unwrap_or_default();
            QuizOption {
                label,
                match_text,
                flagged: is_flagged_correct(obj),
            }
        }
        Value::Number(n) => QuizOption {
            label: n.to_string(),
            match_text: n.to_string(),
            flagged: false,
        },
        _ => QuizOption {
            label: MISSING_OPTION_LABEL.to_string(),
            match_text: String::new(),
            flagged: false,
        },
    }
}

fn is_flagged_correct(obj: &Map<String, Value>) -> bool {
    ["is_correct", "correct"]
        .iter()
        .any(|field| obj.get(*field) == Some(&Value::Bool(true)))
}

/// Display text for a field, skipping empty strings, zero and false.
fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
