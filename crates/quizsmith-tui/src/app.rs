// Application state and orchestration logic.
//
// The app task owns the session and the API client. It processes one
// `UserCommand` at a time, so at most one request is outstanding, and
// reports every outcome to the TUI as `UiUpdate` messages.

use tokio::sync::mpsc;
use tracing::{info, warn};

use quizsmith_core::api::ApiError;
use quizsmith_core::avatar::{self, AvatarError};
use quizsmith_core::config::Config;
use quizsmith_core::model::{Credentials, GenerateRequest, NewQuiz, ProfileUpdate};
use quizsmith_core::quiz::{parse_content, QuizAttempt};
use quizsmith_core::session::Session;

use crate::protocol::{UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// User-facing messages
// ---------------------------------------------------------------------------

pub const LOGIN_FAILED: &str = "Failed to log in. Please check your email and password.";
pub const REGISTER_FAILED: &str = "Failed to register. Please try again.";
pub const QUIZZES_FAILED: &str = "Could not load your quizzes. Please try again later.";
pub const DELETE_FAILED: &str = "Failed to delete quiz.";
pub const GENERATE_FAILED: &str = "Could not generate the quiz. Please try again.";
pub const QUIZ_NOT_FOUND: &str = "Could not load the quiz. It may not exist.";
pub const QUIZ_UNREADABLE: &str = "Error: Could not load quiz questions.";
pub const QUIZ_EMPTY: &str = "No questions found in this quiz.";
pub const PROFILE_SAVED: &str = "Profile updated successfully!";
pub const PROFILE_FAILED: &str = "Failed to update profile.";
pub const TOPIC_REQUIRED: &str = "Please enter a topic.";

/// Alert shown when a picked avatar exceeds `max_bytes`.
pub fn avatar_too_big(max_bytes: u64) -> String {
    format!(
        "File is too big! Please choose a smaller image (under {}KB).",
        max_bytes / 1000
    )
}

pub fn question_count_out_of_range(max: u32) -> String {
    format!("Number of questions must be between 1 and {max}.")
}

/// Description stored with a generated quiz.
pub fn quiz_description(topic: &str, num_questions: u32) -> String {
    format!("A quiz about {topic} with {num_questions} questions.")
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub config: Config,
    pub session: Session,
}

impl AppState {
    pub fn new(config: Config, session: Session) -> Self {
        AppState { config, session }
    }

    /// Log out when `err` shows the server no longer accepts our token.
    /// Returns true if the session was ended.
    async fn expire_if_unauthorized(&mut self, err: &ApiError, ui_tx: &mpsc::Sender<UiUpdate>) -> bool {
        if !err.is_unauthorized() || self.session.token().is_none() {
            return false;
        }
        warn!("server rejected the session token, logging out");
        self.session.logout();
        let _ = ui_tx.send(UiUpdate::SessionExpired).await;
        true
    }
}

/// Check a generation request before it is sent.
pub fn validate_generate(topic: &str, num_questions: u32, max: u32) -> Result<(), String> {
    if topic.trim().is_empty() {
        return Err(TOPIC_REQUIRED.to_string());
    }
    if num_questions == 0 || num_questions > max {
        return Err(question_count_out_of_range(max));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop.
///
/// Restores the persisted session first and reports it with
/// `UiUpdate::AuthReady`, then handles user commands until `Quit` arrives or
/// the command channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let user = state.session.load_user().await.cloned();
    match &user {
        Some(u) => info!("Restored session for {}", u.email),
        None => info!("No active session"),
    }
    let _ = ui_tx.send(UiUpdate::AuthReady(user)).await;

    loop {
        match cmd_rx.recv().await {
            Some(UserCommand::Quit) => {
                info!("Quit command received, shutting down");
                break;
            }
            Some(cmd) => {
                handle_user_command(&mut state, cmd, &ui_tx).await;
            }
            None => {
                info!("Command channel closed, shutting down");
                break;
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

/// Whether `cmd` talks to the server and should raise the busy flag.
fn is_network_command(cmd: &UserCommand) -> bool {
    !matches!(
        cmd,
        UserCommand::Logout | UserCommand::LoadAvatar(_) | UserCommand::Quit
    )
}

async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let network = is_network_command(&cmd);
    if network {
        let _ = ui_tx.send(UiUpdate::Busy(true)).await;
    }

    match cmd {
        UserCommand::Login { email, password } => {
            login(state, Credentials::new(email, password), ui_tx).await;
        }
        UserCommand::Register { email, password } => {
            register(state, Credentials::new(email, password), ui_tx).await;
        }
        UserCommand::Logout => {
            state.session.logout();
            let _ = ui_tx.send(UiUpdate::LoggedOut).await;
        }
        UserCommand::RefreshQuizzes => refresh_quizzes(state, ui_tx).await,
        UserCommand::DeleteQuiz(quiz_id) => delete_quiz(state, quiz_id, ui_tx).await,
        UserCommand::GenerateQuiz {
            topic,
            num_questions,
        } => generate_quiz(state, topic.trim(), num_questions, ui_tx).await,
        UserCommand::OpenQuiz(quiz_id) => open_quiz(state, quiz_id, ui_tx).await,
        UserCommand::SaveScore { quiz_id, score } => {
            match state.session.api().save_score(quiz_id, score).await {
                Ok(()) => info!("Saved score {:.1} for quiz {}", score, quiz_id),
                Err(e) => warn!("Failed to save score for quiz {}: {}", quiz_id, e),
            }
        }
        UserCommand::LoadAvatar(path) => {
            let max = state.config.profile.max_avatar_bytes;
            match avatar::load_avatar(&path, max) {
                Ok(uri) => {
                    let _ = ui_tx.send(UiUpdate::AvatarLoaded(uri)).await;
                }
                Err(AvatarError::TooLarge { size, .. }) => {
                    info!("Rejected avatar {} ({} bytes)", path.display(), size);
                    let _ = ui_tx.send(UiUpdate::Alert(avatar_too_big(max))).await;
                }
                Err(e) => {
                    info!("Rejected avatar: {}", e);
                    let _ = ui_tx.send(UiUpdate::Alert(capitalize(&e.to_string()))).await;
                }
            }
        }
        UserCommand::SaveProfile { full_name, avatar } => {
            save_profile(state, full_name, avatar, ui_tx).await;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }

    if network {
        let _ = ui_tx.send(UiUpdate::Busy(false)).await;
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn login(state: &mut AppState, credentials: Credentials, ui_tx: &mpsc::Sender<UiUpdate>) {
    match state.session.login(&credentials).await {
        Ok(user) => {
            let _ = ui_tx.send(UiUpdate::LoggedIn(user)).await;
        }
        Err(e) => {
            warn!("Login failed for {}: {}", credentials.email, e);
            let _ = ui_tx.send(UiUpdate::FormError(LOGIN_FAILED.into())).await;
        }
    }
}

async fn register(state: &mut AppState, credentials: Credentials, ui_tx: &mpsc::Sender<UiUpdate>) {
    match state.session.register(&credentials).await {
        Ok(()) => {
            let _ = ui_tx.send(UiUpdate::Registered).await;
        }
        Err(e) => {
            warn!("Registration failed for {}: {}", credentials.email, e);
            let message = e.detail().unwrap_or(REGISTER_FAILED).to_string();
            let _ = ui_tx.send(UiUpdate::FormError(message)).await;
        }
    }
}

async fn refresh_quizzes(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let result = state.session.api().list_quizzes().await;
    match result {
        Ok(quizzes) => {
            info!("Loaded {} quizzes", quizzes.len());
            let _ = ui_tx.send(UiUpdate::QuizzesLoaded(quizzes)).await;
        }
        Err(e) => {
            warn!("Failed to load quizzes: {}", e);
            if !state.expire_if_unauthorized(&e, ui_tx).await {
                let _ = ui_tx.send(UiUpdate::QuizzesFailed(QUIZZES_FAILED.into())).await;
            }
        }
    }
}

async fn delete_quiz(state: &mut AppState, quiz_id: i64, ui_tx: &mpsc::Sender<UiUpdate>) {
    let result = state.session.api().delete_quiz(quiz_id).await;
    match result {
        Ok(()) => {
            info!("Deleted quiz {}", quiz_id);
            let _ = ui_tx.send(UiUpdate::QuizRemoved(quiz_id)).await;
        }
        Err(e) => {
            warn!("Failed to delete quiz {}: {}", quiz_id, e);
            if !state.expire_if_unauthorized(&e, ui_tx).await {
                let _ = ui_tx.send(UiUpdate::Alert(DELETE_FAILED.into())).await;
            }
        }
    }
}

/// Generate questions for `topic` and save them as a new quiz.
async fn generate_quiz(
    state: &mut AppState,
    topic: &str,
    num_questions: u32,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    if let Err(message) = validate_generate(topic, num_questions, state.config.quiz.max_questions) {
        let _ = ui_tx.send(UiUpdate::FormError(message)).await;
        return;
    }

    info!("Generating {} questions about {:?}", num_questions, topic);
    let request = GenerateRequest::for_topic(topic, num_questions);
    let generated = state.session.api().generate_quiz(&request).await;
    let response = match generated {
        Ok(response) => response,
        Err(e) => {
            warn!("Quiz generation failed: {}", e);
            if !state.expire_if_unauthorized(&e, ui_tx).await {
                let message = e.detail().unwrap_or(GENERATE_FAILED).to_string();
                let _ = ui_tx.send(UiUpdate::FormError(message)).await;
            }
            return;
        }
    };

    let Some(questions) = response.questions() else {
        warn!(
            "Generator returned no usable questions (raw: {:?})",
            response.raw.as_deref().unwrap_or("")
        );
        let _ = ui_tx.send(UiUpdate::FormError(GENERATE_FAILED.into())).await;
        return;
    };

    let content = match serde_json::to_string(questions) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to serialize generated questions: {}", e);
            let _ = ui_tx.send(UiUpdate::FormError(GENERATE_FAILED.into())).await;
            return;
        }
    };

    let quiz = NewQuiz {
        title: topic.to_string(),
        description: Some(quiz_description(topic, num_questions)),
        content,
    };
    let saved = state.session.api().save_quiz(&quiz).await;
    match saved {
        Ok(saved) => {
            info!("Saved generated quiz {:?} as {:?}", topic, saved.quiz_id);
            let _ = ui_tx
                .send(UiUpdate::QuizGenerated {
                    title: topic.to_string(),
                })
                .await;
        }
        Err(e) => {
            warn!("Failed to save generated quiz: {}", e);
            if !state.expire_if_unauthorized(&e, ui_tx).await {
                let message = e.detail().unwrap_or(GENERATE_FAILED).to_string();
                let _ = ui_tx.send(UiUpdate::FormError(message)).await;
            }
        }
    }
}

async fn open_quiz(state: &mut AppState, quiz_id: i64, ui_tx: &mpsc::Sender<UiUpdate>) {
    let fetched = state.session.api().get_quiz(quiz_id).await;
    let detail = match fetched {
        Ok(detail) => detail,
        Err(e) => {
            warn!("Failed to fetch quiz {}: {}", quiz_id, e);
            if !state.expire_if_unauthorized(&e, ui_tx).await {
                let _ = ui_tx.send(UiUpdate::QuizLoadFailed(QUIZ_NOT_FOUND.into())).await;
            }
            return;
        }
    };

    let update = match parse_content(&detail.content) {
        Ok(questions) if questions.is_empty() => UiUpdate::QuizLoadFailed(QUIZ_EMPTY.into()),
        Ok(questions) => {
            info!("Opened quiz {} with {} questions", detail.id, questions.len());
            UiUpdate::QuizLoaded(Box::new(QuizAttempt::new(detail.id, detail.title, questions)))
        }
        Err(e) => {
            warn!("Failed to parse content of quiz {}: {}", quiz_id, e);
            UiUpdate::QuizLoadFailed(QUIZ_UNREADABLE.into())
        }
    };
    let _ = ui_tx.send(update).await;
}

async fn save_profile(
    state: &mut AppState,
    full_name: String,
    avatar: Option<String>,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let update = ProfileUpdate {
        full_name: Some(full_name.trim().to_string()),
        avatar,
    };
    let result = state.session.api().update_profile(&update).await;
    match result {
        Ok(user) => {
            info!("Profile updated for {}", user.email);
            state.session.replace_user(user.clone());
            let _ = ui_tx.send(UiUpdate::ProfileSaved(user)).await;
            let _ = ui_tx.send(UiUpdate::Notice(PROFILE_SAVED.into())).await;
        }
        Err(e) => {
            warn!("Failed to update profile: {}", e);
            if !state.expire_if_unauthorized(&e, ui_tx).await {
                let _ = ui_tx.send(UiUpdate::FormError(PROFILE_FAILED.into())).await;
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
