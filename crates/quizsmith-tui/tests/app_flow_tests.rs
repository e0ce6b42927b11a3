// Integration tests for the quiz client orchestrator.
//
// These run `app::run` on its own task against a scripted in-memory API,
// send `UserCommand`s the way the TUI does and check the `UiUpdate`s that
// come back. The later tests feed those updates through `ViewState` and
// `input::handle_key` so the whole screen flow is exercised without a
// terminal.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use quizsmith_core::api::{ApiError, QuizApi};
use quizsmith_core::config::{ApiConfig, Config, ProfileConfig, QuizConfig, StorageConfig};
use quizsmith_core::model::{
    Credentials, GenerateRequest, GenerateResponse, NewQuiz, ProfileUpdate, QuizDetail,
    QuizSummary, SavedQuiz, TokenResponse, User,
};
use quizsmith_core::session::{Session, TOKEN_KEY};
use quizsmith_core::store::LocalStore;
use quizsmith_tui::app::{self, AppState};
use quizsmith_tui::protocol::{Screen, UiUpdate, UserCommand};
use quizsmith_tui::tui::{self, input, AuthView, Dialog, ViewState};

// ===========================================================================
// Scripted API
// ===========================================================================

const GOOD_TOKEN: &str = "good-token";

#[derive(Default)]
struct MockApi {
    token: Mutex<Option<String>>,
    quizzes: Mutex<Vec<QuizSummary>>,
    generated: Mutex<Option<GenerateResponse>>,
    saved: Mutex<Vec<NewQuiz>>,
    scores: Mutex<Vec<(i64, f64)>>,
    profile_updates: Mutex<Vec<ProfileUpdate>>,
    /// Reject every quiz request as if the token had expired.
    expired: AtomicBool,
}

impl MockApi {
    fn authorized(&self) -> Result<(), ApiError> {
        let ok = self.token.lock().unwrap().as_deref() == Some(GOOD_TOKEN)
            && !self.expired.load(Ordering::SeqCst);
        if ok {
            Ok(())
        } else {
            Err(ApiError::Unauthorized {
                detail: Some("Could not validate credentials".into()),
            })
        }
    }
}

fn ada() -> User {
    User {
        id: Some(1),
        email: "ada@example.com".into(),
        full_name: Some("Ada".into()),
        avatar: None,
    }
}

fn summary(id: i64, title: &str) -> QuizSummary {
    QuizSummary {
        id,
        title: title.into(),
        description: Some(format!("A quiz about {title} with 2 questions.")),
        content: Value::Null,
        created_at: Some("2026-03-01T10:00:00".into()),
        best_score: None,
    }
}

fn planets_content() -> Value {
    Value::String(
        json!([
            {"question": "Largest planet?", "options": ["Mars", "Jupiter"], "answer": "B"},
            {"question": "Red planet?", "options": ["Mars", "Venus"], "answer": "Mars"}
        ])
        .to_string(),
    )
}

#[async_trait]
impl QuizApi for MockApi {
    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }

    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        if credentials.password == "pw" {
            Ok(TokenResponse {
                access_token: GOOD_TOKEN.into(),
                token_type: "bearer".into(),
            })
        } else {
            Err(ApiError::Unauthorized {
                detail: Some("Incorrect email or password".into()),
            })
        }
    }

    async fn register(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        if credentials.email == "ada@example.com" {
            return Err(ApiError::Status {
                status: 400,
                detail: Some("Email already registered".into()),
            });
        }
        Ok(TokenResponse {
            access_token: "unused".into(),
            token_type: "bearer".into(),
        })
    }

    async fn me(&self) -> Result<User, ApiError> {
        match self.token.lock().unwrap().as_deref() {
            Some(GOOD_TOKEN) => Ok(ada()),
            _ => Err(ApiError::Unauthorized { detail: None }),
        }
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        self.authorized()?;
        self.profile_updates.lock().unwrap().push(update.clone());
        let mut user = ada();
        user.full_name = update.full_name.clone();
        user.avatar = update.avatar.clone();
        Ok(user)
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, ApiError> {
        self.authorized()?;
        Ok(self.quizzes.lock().unwrap().clone())
    }

    async fn get_quiz(&self, quiz_id: i64) -> Result<QuizDetail, ApiError> {
        self.authorized()?;
        let quizzes = self.quizzes.lock().unwrap();
        let quiz = quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .ok_or(ApiError::Status {
                status: 404,
                detail: Some("Quiz not found".into()),
            })?;
        Ok(QuizDetail {
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            content: quiz.content.clone(),
            created_at: quiz.created_at.clone(),
        })
    }

    async fn save_quiz(&self, quiz: &NewQuiz) -> Result<SavedQuiz, ApiError> {
        self.authorized()?;
        self.saved.lock().unwrap().push(quiz.clone());
        Ok(SavedQuiz {
            ok: true,
            quiz_id: Some(99),
        })
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<(), ApiError> {
        self.authorized()?;
        let mut quizzes = self.quizzes.lock().unwrap();
        let before = quizzes.len();
        quizzes.retain(|q| q.id != quiz_id);
        if quizzes.len() == before {
            return Err(ApiError::Status {
                status: 404,
                detail: None,
            });
        }
        Ok(())
    }

    async fn generate_quiz(&self, _request: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        self.authorized()?;
        Ok(self.generated.lock().unwrap().clone().unwrap_or(GenerateResponse {
            ok: false,
            data: None,
            raw: Some("no script".into()),
        }))
    }

    async fn submit_quiz(
        &self,
        _quiz_id: i64,
        _answers: &BTreeMap<String, usize>,
    ) -> Result<Value, ApiError> {
        self.authorized()?;
        Ok(json!({"ok": true}))
    }

    async fn save_score(&self, quiz_id: i64, score: f64) -> Result<(), ApiError> {
        self.authorized()?;
        self.scores.lock().unwrap().push((quiz_id, score));
        Ok(())
    }
}

// ===========================================================================
// Harness
// ===========================================================================

fn test_config(max_avatar_bytes: u64) -> Config {
    Config {
        api: ApiConfig {
            base_url: "http://127.0.0.1:9/api".into(),
            timeout_secs: 5,
        },
        storage: StorageConfig::default(),
        quiz: QuizConfig::default(),
        profile: ProfileConfig { max_avatar_bytes },
    }
}

struct Harness {
    api: Arc<MockApi>,
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

/// Start the app task. `stored_token` is placed in the local store first.
fn start(api: MockApi, stored_token: Option<&str>) -> Harness {
    let api = Arc::new(api);
    let store = LocalStore::open(":memory:").unwrap();
    if let Some(token) = stored_token {
        store.set_item(TOKEN_KEY, token).unwrap();
    }
    let session = Session::new(api.clone(), store);
    let state = AppState::new(test_config(1_000), session);

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let handle = tokio::spawn(app::run(cmd_rx, ui_tx, state));
    Harness {
        api,
        cmd_tx,
        ui_rx,
        handle,
    }
}

impl Harness {
    async fn next(&mut self) -> UiUpdate {
        tokio::time::timeout(Duration::from_secs(5), self.ui_rx.recv())
            .await
            .expect("timed out waiting for a UI update")
            .expect("UI channel closed")
    }

    /// Next update that is not a busy toggle.
    async fn next_result(&mut self) -> UiUpdate {
        loop {
            match self.next().await {
                UiUpdate::Busy(_) => continue,
                update => return update,
            }
        }
    }

    async fn send(&self, cmd: UserCommand) {
        self.cmd_tx.send(cmd).await.unwrap();
    }

    /// Apply updates to `view` until `done` matches one and the busy flag
    /// has dropped again, forwarding any follow-up commands to the app like
    /// the TUI loop does.
    async fn pump(&mut self, view: &mut ViewState, done: impl Fn(&UiUpdate) -> bool) {
        let mut finished = false;
        while !finished || view.busy {
            let update = self.next().await;
            finished |= done(&update);
            if let Some(cmd) = tui::apply_ui_update(view, update) {
                self.send(cmd).await;
            }
        }
    }

    async fn key(&mut self, view: &mut ViewState, code: KeyCode) {
        if let Some(cmd) = input::handle_key(press(code), view) {
            self.send(cmd).await;
        }
    }

    async fn type_text(&mut self, view: &mut ViewState, text: &str) {
        for c in text.chars() {
            self.key(view, KeyCode::Char(c)).await;
        }
    }

    async fn shutdown(self) {
        self.cmd_tx.send(UserCommand::Quit).await.unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

// ===========================================================================
// Orchestrator messages
// ===========================================================================

#[tokio::test]
async fn stored_token_restores_user_on_startup() {
    let mut h = start(MockApi::default(), Some(GOOD_TOKEN));
    match h.next().await {
        UiUpdate::AuthReady(Some(user)) => assert_eq!(user.email, "ada@example.com"),
        other => panic!("expected AuthReady with user, got {other:?}"),
    }
    h.shutdown().await;
}

#[tokio::test]
async fn invalid_stored_token_starts_anonymous() {
    let mut h = start(MockApi::default(), Some("stale"));
    assert!(matches!(h.next().await, UiUpdate::AuthReady(None)));
    assert!(h.api.token.lock().unwrap().is_none());
    h.shutdown().await;
}

#[tokio::test]
async fn failed_login_reports_form_error_inside_busy_bracket() {
    let mut h = start(MockApi::default(), None);
    assert!(matches!(h.next().await, UiUpdate::AuthReady(None)));

    h.send(UserCommand::Login {
        email: "ada@example.com".into(),
        password: "wrong".into(),
    })
    .await;
    assert!(matches!(h.next().await, UiUpdate::Busy(true)));
    match h.next().await {
        UiUpdate::FormError(message) => assert_eq!(message, app::LOGIN_FAILED),
        other => panic!("expected FormError, got {other:?}"),
    }
    assert!(matches!(h.next().await, UiUpdate::Busy(false)));
    h.shutdown().await;
}

#[tokio::test]
async fn duplicate_registration_shows_server_detail() {
    let mut h = start(MockApi::default(), None);
    h.next().await;

    h.send(UserCommand::Register {
        email: "ada@example.com".into(),
        password: "pw".into(),
    })
    .await;
    match h.next_result().await {
        UiUpdate::FormError(message) => assert_eq!(message, "Email already registered"),
        other => panic!("expected FormError, got {other:?}"),
    }

    h.send(UserCommand::Register {
        email: "new@example.com".into(),
        password: "pw".into(),
    })
    .await;
    assert!(matches!(h.next_result().await, UiUpdate::Registered));
    h.shutdown().await;
}

#[tokio::test]
async fn expired_token_logs_out_on_refresh() {
    let api = MockApi::default();
    api.expired.store(true, Ordering::SeqCst);
    let mut h = start(api, Some(GOOD_TOKEN));
    assert!(matches!(h.next().await, UiUpdate::AuthReady(Some(_))));

    h.send(UserCommand::RefreshQuizzes).await;
    assert!(matches!(h.next_result().await, UiUpdate::SessionExpired));
    assert!(h.api.token.lock().unwrap().is_none());
    h.shutdown().await;
}

#[tokio::test]
async fn generated_quiz_is_saved_with_topic_and_description() {
    let api = MockApi::default();
    *api.generated.lock().unwrap() = Some(GenerateResponse {
        ok: true,
        data: Some(json!([{"question": "Q1", "options": ["a", "b"], "answer": "A"}])),
        raw: None,
    });
    let mut h = start(api, Some(GOOD_TOKEN));
    h.next().await;

    h.send(UserCommand::GenerateQuiz {
        topic: "  Volcanoes ".into(),
        num_questions: 1,
    })
    .await;
    match h.next_result().await {
        UiUpdate::QuizGenerated { title } => assert_eq!(title, "Volcanoes"),
        other => panic!("expected QuizGenerated, got {other:?}"),
    }

    let saved = h.api.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].title, "Volcanoes");
    assert_eq!(
        saved[0].description.as_deref(),
        Some("A quiz about Volcanoes with 1 questions.")
    );
    let content: Value = serde_json::from_str(&saved[0].content).unwrap();
    assert_eq!(content[0]["question"], "Q1");
    h.shutdown().await;
}

#[tokio::test]
async fn unusable_generation_is_not_saved() {
    let mut h = start(MockApi::default(), Some(GOOD_TOKEN));
    h.next().await;

    h.send(UserCommand::GenerateQuiz {
        topic: "Nonsense".into(),
        num_questions: 3,
    })
    .await;
    match h.next_result().await {
        UiUpdate::FormError(message) => assert_eq!(message, app::GENERATE_FAILED),
        other => panic!("expected FormError, got {other:?}"),
    }
    assert!(h.api.saved.lock().unwrap().is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn out_of_range_question_count_is_rejected_before_request() {
    let mut h = start(MockApi::default(), Some(GOOD_TOKEN));
    h.next().await;

    h.send(UserCommand::GenerateQuiz {
        topic: "Rust".into(),
        num_questions: 21,
    })
    .await;
    match h.next_result().await {
        UiUpdate::FormError(message) => {
            assert_eq!(message, app::question_count_out_of_range(20))
        }
        other => panic!("expected FormError, got {other:?}"),
    }
    h.shutdown().await;
}

#[tokio::test]
async fn opening_missing_or_empty_quiz_fails_cleanly() {
    let api = MockApi::default();
    api.quizzes.lock().unwrap().push(summary(5, "Empty"));
    let mut h = start(api, Some(GOOD_TOKEN));
    h.next().await;

    h.send(UserCommand::OpenQuiz(5)).await;
    match h.next_result().await {
        UiUpdate::QuizLoadFailed(message) => assert_eq!(message, app::QUIZ_EMPTY),
        other => panic!("expected QuizLoadFailed, got {other:?}"),
    }

    h.send(UserCommand::OpenQuiz(404)).await;
    match h.next_result().await {
        UiUpdate::QuizLoadFailed(message) => assert_eq!(message, app::QUIZ_NOT_FOUND),
        other => panic!("expected QuizLoadFailed, got {other:?}"),
    }
    h.shutdown().await;
}

#[tokio::test]
async fn oversize_avatar_raises_alert() {
    let path = std::env::temp_dir().join("quizsmith_app_flow_big_avatar.png");
    std::fs::write(&path, vec![0u8; 2_000]).unwrap();

    let mut h = start(MockApi::default(), Some(GOOD_TOKEN));
    h.next().await;
    h.send(UserCommand::LoadAvatar(path.clone())).await;
    match h.next().await {
        UiUpdate::Alert(message) => assert_eq!(message, app::avatar_too_big(1_000)),
        other => panic!("expected Alert, got {other:?}"),
    }
    h.shutdown().await;
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn profile_save_sends_name_and_avatar() {
    let mut h = start(MockApi::default(), Some(GOOD_TOKEN));
    h.next().await;

    h.send(UserCommand::SaveProfile {
        full_name: " Ada Lovelace ".into(),
        avatar: Some("data:image/png;base64,aGVsbG8=".into()),
    })
    .await;
    match h.next_result().await {
        UiUpdate::ProfileSaved(user) => assert_eq!(user.display_name(), "Ada Lovelace"),
        other => panic!("expected ProfileSaved, got {other:?}"),
    }
    match h.next_result().await {
        UiUpdate::Notice(message) => assert_eq!(message, app::PROFILE_SAVED),
        other => panic!("expected Notice, got {other:?}"),
    }
    let updates = h.api.profile_updates.lock().unwrap().clone();
    assert_eq!(updates[0].full_name.as_deref(), Some("Ada Lovelace"));
    h.shutdown().await;
}

#[tokio::test]
async fn closing_command_channel_stops_app() {
    let h = start(MockApi::default(), None);
    let Harness {
        cmd_tx,
        mut ui_rx,
        handle,
        ..
    } = h;
    drop(cmd_tx);
    while ui_rx.recv().await.is_some() {}
    handle.await.unwrap().unwrap();
}

// ===========================================================================
// Screen flows
// ===========================================================================

#[tokio::test]
async fn login_then_dashboard_lists_quizzes() {
    let api = MockApi::default();
    api.quizzes.lock().unwrap().push(summary(1, "Planets"));
    let mut h = start(api, None);
    let mut view = ViewState::default();

    h.pump(&mut view, |u| matches!(u, UiUpdate::AuthReady(_))).await;
    assert_eq!(view.screen, Screen::Login);

    h.type_text(&mut view, "ada@example.com").await;
    h.key(&mut view, KeyCode::Tab).await;
    h.type_text(&mut view, "pw").await;
    h.key(&mut view, KeyCode::Enter).await;

    h.pump(&mut view, |u| matches!(u, UiUpdate::QuizzesLoaded(_)))
        .await;
    assert_eq!(view.screen, Screen::Dashboard);
    assert!(matches!(view.auth, AuthView::Authenticated(_)));
    assert_eq!(view.dashboard.quizzes.len(), 1);
    assert!(!view.dashboard.loading);

    h.shutdown().await;
}

#[tokio::test]
async fn take_quiz_and_save_score() {
    let api = MockApi::default();
    let mut quiz = summary(12, "Planets");
    quiz.content = planets_content();
    api.quizzes.lock().unwrap().push(quiz);
    let mut h = start(api, Some(GOOD_TOKEN));
    let mut view = ViewState::default();

    h.pump(&mut view, |u| matches!(u, UiUpdate::QuizzesLoaded(_)))
        .await;
    h.key(&mut view, KeyCode::Enter).await;
    assert_eq!(view.screen, Screen::TakeQuiz(12));
    h.pump(&mut view, |u| matches!(u, UiUpdate::QuizLoaded(_))).await;

    h.key(&mut view, KeyCode::Char('2')).await; // Jupiter
    h.key(&mut view, KeyCode::Right).await;
    h.key(&mut view, KeyCode::Char('2')).await; // Venus, wrong
    h.key(&mut view, KeyCode::Char('s')).await;
    assert!(matches!(view.dialog, Some(Dialog::Confirm(_))));
    h.key(&mut view, KeyCode::Char('y')).await;

    let result = view.take_quiz.as_ref().unwrap().result.unwrap();
    assert_eq!(result.correct_answers, 1);
    assert_eq!(result.display_score(), "50.0");

    // Score saving is fire-and-forget; wait for its busy bracket to close.
    h.pump(&mut view, |u| matches!(u, UiUpdate::Busy(false))).await;
    assert_eq!(*h.api.scores.lock().unwrap(), vec![(12, 50.0)]);

    h.shutdown().await;
}

#[tokio::test]
async fn delete_confirmed_removes_row() {
    let api = MockApi::default();
    api.quizzes
        .lock()
        .unwrap()
        .extend([summary(1, "Planets"), summary(2, "Rust")]);
    let mut h = start(api, Some(GOOD_TOKEN));
    let mut view = ViewState::default();

    h.pump(&mut view, |u| matches!(u, UiUpdate::QuizzesLoaded(_)))
        .await;
    h.key(&mut view, KeyCode::Down).await;
    h.key(&mut view, KeyCode::Char('d')).await;
    h.key(&mut view, KeyCode::Char('y')).await;
    h.pump(&mut view, |u| matches!(u, UiUpdate::QuizRemoved(_))).await;

    let titles: Vec<&str> = view
        .dashboard
        .quizzes
        .iter()
        .map(|q| q.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Planets"]);
    assert_eq!(view.dashboard.selected, 0);
    h.shutdown().await;
}

#[tokio::test]
async fn session_expiry_returns_to_login_and_back() {
    let api = MockApi::default();
    api.quizzes.lock().unwrap().push(summary(1, "Planets"));
    let mut h = start(api, Some(GOOD_TOKEN));
    let mut view = ViewState::default();
    h.pump(&mut view, |u| matches!(u, UiUpdate::QuizzesLoaded(_)))
        .await;

    h.api.expired.store(true, Ordering::SeqCst);
    h.key(&mut view, KeyCode::Char('r')).await;
    h.pump(&mut view, |u| matches!(u, UiUpdate::SessionExpired)).await;
    assert_eq!(view.screen, Screen::Login);
    assert_eq!(view.login.error.as_deref(), Some(tui::SESSION_EXPIRED));
    assert_eq!(view.redirect_to, Some(Screen::Dashboard));

    h.api.expired.store(false, Ordering::SeqCst);
    h.type_text(&mut view, "ada@example.com").await;
    h.key(&mut view, KeyCode::Tab).await;
    h.type_text(&mut view, "pw").await;
    h.key(&mut view, KeyCode::Enter).await;
    h.pump(&mut view, |u| matches!(u, UiUpdate::QuizzesLoaded(_)))
        .await;
    assert_eq!(view.screen, Screen::Dashboard);
    h.shutdown().await;
}
