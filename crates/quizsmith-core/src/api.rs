// HTTP client for the quiz REST API.
//
// Every request is built through `ApiClient::request`, which attaches the
// bearer token when one is set. Non-2xx responses are mapped into `ApiError`
// with the server's `detail` message when the body carries one.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::{
    Credentials, GenerateRequest, GenerateResponse, NewQuiz, ProfileUpdate, QuizDetail,
    QuizSummary, SavedQuiz, TokenResponse, User,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not authenticated: {}", .detail.as_deref().unwrap_or("unauthorized"))]
    Unauthorized { detail: Option<String> },

    #[error("API returned status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Human-readable message supplied by the server, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

// ---------------------------------------------------------------------------
// QuizApi trait
// ---------------------------------------------------------------------------

/// The operations the client needs from the quiz API.
///
/// `ApiClient` is the real implementation; the session and app orchestrator
/// only see this trait.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Set or revoke the bearer token attached to subsequent requests.
    fn set_token(&self, token: Option<String>);

    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError>;
    async fn register(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError>;
    async fn me(&self) -> Result<User, ApiError>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError>;

    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, ApiError>;
    async fn get_quiz(&self, quiz_id: i64) -> Result<QuizDetail, ApiError>;
    async fn save_quiz(&self, quiz: &NewQuiz) -> Result<SavedQuiz, ApiError>;
    async fn delete_quiz(&self, quiz_id: i64) -> Result<(), ApiError>;
    async fn generate_quiz(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError>;
    async fn submit_quiz(
        &self,
        quiz_id: i64,
        answers: &BTreeMap<String, usize>,
    ) -> Result<Value, ApiError>;
    async fn save_score(&self, quiz_id: i64, score: f64) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// reqwest-backed implementation of `QuizApi`.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client rooted at `base_url` (e.g. `http://host:8000/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bearer token currently attached to requests.
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build a request for `path`, attaching the bearer token when set.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send `builder` and decode a JSON body of type `T`.
    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let text = self.send(builder, endpoint).await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// Send `builder` and return the raw body of a successful response.
    async fn send(&self, builder: RequestBuilder, endpoint: &str) -> Result<String, ApiError> {
        let response = builder.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "request failed");
            ApiError::Transport(e)
        })?;
        let status = response.status();
        let text = response.text().await?;
        debug!(endpoint, status = status.as_u16(), "response received");

        if status.is_success() {
            return Ok(text);
        }

        let detail = extract_detail(&text);
        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized { detail })
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

#[async_trait]
impl QuizApi for ApiClient {
    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let req = self.request(Method::POST, "/auth/login").json(credentials);
        self.send_json(req, "POST /auth/login").await
    }

    async fn register(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let req = self.request(Method::POST, "/auth/register").json(credentials);
        self.send_json(req, "POST /auth/register").await
    }

    async fn me(&self) -> Result<User, ApiError> {
        let req = self.request(Method::GET, "/users/me");
        self.send_json(req, "GET /users/me").await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let req = self.request(Method::PUT, "/users/me").json(update);
        self.send_json(req, "PUT /users/me").await
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, ApiError> {
        let req = self.request(Method::GET, "/quizzes");
        self.send_json(req, "GET /quizzes").await
    }

    async fn get_quiz(&self, quiz_id: i64) -> Result<QuizDetail, ApiError> {
        let req = self.request(Method::GET, &format!("/quizzes/{quiz_id}"));
        self.send_json(req, "GET /quizzes/{id}").await
    }

    async fn save_quiz(&self, quiz: &NewQuiz) -> Result<SavedQuiz, ApiError> {
        let req = self.request(Method::POST, "/quizzes").json(quiz);
        self.send_json(req, "POST /quizzes").await
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &format!("/quizzes/{quiz_id}"));
        self.send(req, "DELETE /quizzes/{id}").await.map(|_| ())
    }

    async fn generate_quiz(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        let req = self.request(Method::POST, "/generate-quiz").json(request);
        self.send_json(req, "POST /generate-quiz").await
    }

    async fn submit_quiz(
        &self,
        quiz_id: i64,
        answers: &BTreeMap<String, usize>,
    ) -> Result<Value, ApiError> {
        let body = serde_json::json!({ "answers": answers });
        let req = self
            .request(Method::POST, &format!("/quizzes/{quiz_id}/submit"))
            .json(&body);
        self.send_json(req, "POST /quizzes/{id}/submit").await
    }

    async fn save_score(&self, quiz_id: i64, score: f64) -> Result<(), ApiError> {
        let body = serde_json::json!({ "score": score });
        let req = self
            .request(Method::POST, &format!("/quizzes/{quiz_id}/score"))
            .json(&body);
        self.send(req, "POST /quizzes/{id}/score").await.map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Error body parsing
// ---------------------------------------------------------------------------

/// Extract the `detail` message from an error body.
///
/// Accepts `{"detail": "..."}` and the validation shape
/// `{"detail": [{"msg": "..."}, ...]}` (messages joined with "; ").
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    match v.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
