// Wire types exchanged with the quiz API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Email/password pair used for both login and registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Profile picture as a `data:` URI.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    /// Name to greet the user with: full name when set, email otherwise.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Body of `PUT /users/me`. Absent fields are left unchanged server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Entry of `GET /quizzes`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Highest percentage the user reached on this quiz.
    #[serde(default)]
    pub best_score: Option<f64>,
}

/// Body of `GET /quizzes/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuizDetail {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /quizzes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuiz {
    pub title: String,
    pub description: Option<String>,
    /// Question list serialized as a JSON string.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavedQuiz {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub quiz_id: Option<i64>,
}

/// Body of `POST /generate-quiz`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub title: String,
    pub max_questions: u32,
}

impl GenerateRequest {
    /// The topic doubles as prompt and title.
    pub fn for_topic(topic: &str, max_questions: u32) -> Self {
        GenerateRequest {
            prompt: topic.to_string(),
            title: topic.to_string(),
            max_questions,
        }
    }
}

/// Response of `POST /generate-quiz`. `raw` carries unparseable model
/// output when `ok` is false.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub raw: Option<String>,
}

impl GenerateResponse {
    /// Generated question payload, when the server reported success.
    pub fn questions(&self) -> Option<&Value> {
        if !self.ok {
            return None;
        }
        self.data.as_ref().filter(|d| !d.is_null())
    }
}
