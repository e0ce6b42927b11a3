// Terminal UI: screens, input handling, and widget rendering.
//
// The TUI owns a `ViewState` describing what is on screen. The app
// orchestrator pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps. Key presses are
// translated into `UserCommand`s by `input::handle_key`.

pub mod form;
pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::layout::Alignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use quizsmith_core::model::{QuizSummary, User};
use quizsmith_core::quiz::{QuizAttempt, QuizResult};

use crate::protocol::{Screen, UiUpdate, UserCommand};

use form::Form;
use layout::build_layout;

/// Shown on the login screen after the server rejects a stored session.
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
pub const ACCOUNT_CREATED: &str = "Account created. Please log in.";

// ---------------------------------------------------------------------------
// View sub-states
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AuthView {
    /// Waiting for the app to validate the stored token.
    Loading,
    Anonymous,
    Authenticated(User),
}

#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub quizzes: Vec<QuizSummary>,
    pub selected: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl DashboardView {
    pub fn selected_quiz(&self) -> Option<&QuizSummary> {
        self.quizzes.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.quizzes.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.quizzes.len() {
            self.selected = self.quizzes.len().saturating_sub(1);
        }
    }
}

/// The quiz being taken. `attempt` is `None` while loading or after a
/// load failure.
#[derive(Debug, Clone)]
pub struct TakeQuizView {
    pub quiz_id: i64,
    pub attempt: Option<QuizAttempt>,
    /// Highlighted option of the current question.
    pub cursor: usize,
    pub result: Option<QuizResult>,
    pub error: Option<String>,
}

impl TakeQuizView {
    fn loading(quiz_id: i64) -> Self {
        TakeQuizView {
            quiz_id,
            attempt: None,
            cursor: 0,
            result: None,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.attempt.is_none() && self.error.is_none()
    }

    /// Put the cursor on the current question's selection, or the top.
    pub fn sync_cursor(&mut self) {
        self.cursor = self
            .attempt
            .as_ref()
            .and_then(QuizAttempt::selected)
            .unwrap_or(0);
    }
}

#[derive(Debug, Clone)]
pub struct ProfileView {
    pub form: Form,
    /// Avatar as a data URI: the saved one, or a newly loaded file.
    pub avatar: Option<String>,
}

impl Default for ProfileView {
    fn default() -> Self {
        ProfileView {
            form: Form::profile(),
            avatar: None,
        }
    }
}

/// Action taken when a confirmation dialog is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Quit,
    DeleteQuiz(i64),
    SubmitQuiz,
    Logout,
}

impl PendingAction {
    pub fn prompt(self) -> &'static str {
        match self {
            PendingAction::Quit => "Really quit?",
            PendingAction::DeleteQuiz(_) => {
                "Are you sure you want to delete this quiz? This cannot be undone."
            }
            PendingAction::SubmitQuiz => "Are you sure you want to submit your answers?",
            PendingAction::Logout => "Are you sure you want to log out?",
        }
    }
}

/// Modal overlay blocking all other input.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Confirm(PendingAction),
    Alert(String),
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state for rendering and input handling.
///
/// Updated via `UiUpdate` messages from the app orchestrator and by key
/// presses. `render_frame` reads this struct to draw the screen.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub screen: Screen,
    /// Protected screen to open once the user logs in.
    pub redirect_to: Option<Screen>,
    pub auth: AuthView,
    /// A network command is in flight; submissions are ignored.
    pub busy: bool,
    pub default_questions: u32,
    pub max_questions: u32,
    pub login: Form,
    pub register: Form,
    pub forgot: Form,
    /// The reset request was "sent"; show the confirmation.
    pub forgot_sent: bool,
    pub generate: Form,
    pub dashboard: DashboardView,
    pub take_quiz: Option<TakeQuizView>,
    pub profile: ProfileView,
    pub dialog: Option<Dialog>,
    pub should_quit: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::new(5, 20)
    }
}

impl ViewState {
    /// Start on the dashboard; it is guarded once the session is known.
    pub fn new(default_questions: u32, max_questions: u32) -> Self {
        ViewState {
            screen: Screen::Dashboard,
            redirect_to: None,
            auth: AuthView::Loading,
            busy: false,
            default_questions,
            max_questions,
            login: Form::login(),
            register: Form::register(),
            forgot: Form::forgot_password(),
            forgot_sent: false,
            generate: Form::generate(default_questions),
            dashboard: DashboardView::default(),
            take_quiz: None,
            profile: ProfileView::default(),
            dialog: None,
            should_quit: false,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match &self.auth {
            AuthView::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Switch to `target`, applying the route guard.
    ///
    /// Anonymous users asking for a protected screen land on the login
    /// screen and are sent on after logging in. While the session is still
    /// loading the screen is only recorded. Returns the command the new
    /// screen needs to load its data.
    pub fn navigate(&mut self, target: Screen) -> Option<UserCommand> {
        match self.auth {
            AuthView::Loading => {
                self.screen = target;
                return None;
            }
            AuthView::Anonymous if target.requires_auth() => {
                debug!("redirecting {:?} to login", target);
                self.redirect_to = Some(target);
                self.screen = Screen::Login;
                return None;
            }
            _ => {}
        }

        self.screen = target;
        match target {
            Screen::Dashboard => {
                self.dashboard.loading = true;
                self.dashboard.error = None;
                Some(UserCommand::RefreshQuizzes)
            }
            Screen::TakeQuiz(quiz_id) => {
                self.take_quiz = Some(TakeQuizView::loading(quiz_id));
                Some(UserCommand::OpenQuiz(quiz_id))
            }
            Screen::Generate => {
                self.generate = Form::generate(self.default_questions);
                None
            }
            Screen::Profile => {
                let mut profile = ProfileView::default();
                if let Some(user) = self.user() {
                    profile
                        .form
                        .set_value(form::FULL_NAME, user.full_name.clone().unwrap_or_default());
                    profile.avatar = user.avatar.clone();
                }
                self.profile = profile;
                None
            }
            Screen::ForgotPassword => {
                self.forgot.reset();
                self.forgot_sent = false;
                None
            }
            Screen::Login | Screen::Register => None,
        }
    }

    /// The form on the current screen, if it has one.
    pub fn current_form_mut(&mut self) -> Option<&mut Form> {
        match self.screen {
            Screen::Login => Some(&mut self.login),
            Screen::Register => Some(&mut self.register),
            Screen::ForgotPassword => Some(&mut self.forgot),
            Screen::Generate => Some(&mut self.generate),
            Screen::Profile => Some(&mut self.profile.form),
            Screen::Dashboard | Screen::TakeQuiz(_) => None,
        }
    }

    /// Drop everything tied to the signed-in user.
    fn clear_user_data(&mut self) {
        self.dashboard = DashboardView::default();
        self.take_quiz = None;
        self.profile = ProfileView::default();
        self.generate = Form::generate(self.default_questions);
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState. Returns a follow-up command when
/// the update leads to a screen that loads data.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) -> Option<UserCommand> {
    match update {
        UiUpdate::AuthReady(user) => {
            state.auth = match user {
                Some(user) => AuthView::Authenticated(user),
                None => AuthView::Anonymous,
            };
            let screen = state.screen;
            state.navigate(screen)
        }
        UiUpdate::LoggedIn(user) => {
            state.auth = AuthView::Authenticated(user);
            state.login.reset();
            let target = state.redirect_to.take().unwrap_or(Screen::Dashboard);
            state.navigate(target)
        }
        UiUpdate::LoggedOut => {
            state.auth = AuthView::Anonymous;
            state.redirect_to = None;
            state.clear_user_data();
            state.navigate(Screen::Login)
        }
        UiUpdate::SessionExpired => {
            let current = state.screen;
            state.auth = AuthView::Anonymous;
            state.clear_user_data();
            state.navigate(current);
            if state.screen != Screen::Login {
                state.navigate(Screen::Login);
            }
            state.login.error = Some(SESSION_EXPIRED.to_string());
            None
        }
        UiUpdate::Registered => {
            state.register.reset();
            state.navigate(Screen::Login);
            state.login.clear_messages();
            state.login.notice = Some(ACCOUNT_CREATED.to_string());
            None
        }
        UiUpdate::Busy(busy) => {
            state.busy = busy;
            None
        }
        UiUpdate::FormError(message) => {
            match state.current_form_mut() {
                Some(form) => {
                    form.notice = None;
                    form.error = Some(message);
                }
                None => state.dialog = Some(Dialog::Alert(message)),
            }
            None
        }
        UiUpdate::Notice(message) => {
            if let Some(form) = state.current_form_mut() {
                form.error = None;
                form.notice = Some(message);
            }
            None
        }
        UiUpdate::Alert(message) => {
            state.dialog = Some(Dialog::Alert(message));
            None
        }
        UiUpdate::QuizzesLoaded(quizzes) => {
            state.dashboard.quizzes = quizzes;
            state.dashboard.loading = false;
            state.dashboard.error = None;
            state.dashboard.clamp_selection();
            None
        }
        UiUpdate::QuizzesFailed(message) => {
            state.dashboard.loading = false;
            state.dashboard.error = Some(message);
            None
        }
        UiUpdate::QuizRemoved(quiz_id) => {
            state.dashboard.quizzes.retain(|q| q.id != quiz_id);
            state.dashboard.clamp_selection();
            None
        }
        UiUpdate::QuizGenerated { title } => {
            debug!("quiz {:?} generated", title);
            state.navigate(Screen::Dashboard)
        }
        UiUpdate::QuizLoaded(attempt) => {
            match state.take_quiz.as_mut() {
                Some(view) if view.quiz_id == attempt.quiz_id() => {
                    view.attempt = Some(*attempt);
                    view.error = None;
                    view.sync_cursor();
                }
                _ => debug!("ignoring quiz {} loaded for another screen", attempt.quiz_id()),
            }
            None
        }
        UiUpdate::QuizLoadFailed(message) => {
            if let Some(view) = state.take_quiz.as_mut() {
                view.attempt = None;
                view.error = Some(message);
            }
            None
        }
        UiUpdate::AvatarLoaded(uri) => {
            state.profile.avatar = Some(uri);
            state.profile.form.clear_messages();
            None
        }
        UiUpdate::ProfileSaved(user) => {
            state.profile.avatar = user.avatar.clone();
            state.auth = AuthView::Authenticated(user);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame for the current screen.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);

    let protected_hidden = state.screen.requires_auth() && state.user().is_none();
    if state.auth == AuthView::Loading || protected_hidden {
        let loading = Paragraph::new("Loading...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(loading, layout.body);
    } else {
        let generate_hint = format!("Choose between 1 and {} questions.", state.max_questions);
        match state.screen {
            Screen::Login => widgets::form::render(
                frame,
                layout.body,
                &state.login,
                " Log In ",
                &["Don't have an account? Ctrl+R to register.", "Forgot your password? Ctrl+F."],
            ),
            Screen::Register => widgets::form::render(
                frame,
                layout.body,
                &state.register,
                " Create Account ",
                &["Already have an account? Esc to log in."],
            ),
            Screen::ForgotPassword => render_forgot_password(frame, layout.body, state),
            Screen::Dashboard => widgets::dashboard::render(frame, layout.body, state),
            Screen::Generate => widgets::form::render(
                frame,
                layout.body,
                &state.generate,
                " Generate a New Quiz ",
                &[generate_hint.as_str()],
            ),
            Screen::TakeQuiz(_) => widgets::take_quiz::render(frame, layout.body, state),
            Screen::Profile => widgets::profile::render(frame, layout.body, state),
        }
    }

    render_help_bar(frame, layout.help_bar, state);

    if let Some(dialog) = &state.dialog {
        widgets::dialog::render(frame, frame.area(), dialog);
    }
}

fn render_forgot_password(frame: &mut Frame, area: ratatui::layout::Rect, state: &ViewState) {
    if state.forgot_sent {
        let email = state.forgot.value(form::EMAIL);
        let lines = vec![
            Line::from(Span::styled(
                "Check your inbox",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(
                "If an account exists for {email}, a password reset link is on its way."
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Esc to return to the login screen.",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
        frame.render_widget(paragraph, layout::centered_rect(70, 7, area));
    } else {
        widgets::form::render(
            frame,
            area,
            &state.forgot,
            " Reset Password ",
            &["Enter your email to receive a reset link."],
        );
    }
}

/// Key hints for the current screen.
pub fn help_text(state: &ViewState) -> &'static str {
    if state.dialog.is_some() {
        return " y/Enter:Confirm | n/Esc:Cancel";
    }
    match state.screen {
        Screen::Login => " Tab:Next field | Enter:Log in | Ctrl+T:Show password | Ctrl+R:Register | Ctrl+F:Forgot | Esc:Quit",
        Screen::Register => " Tab:Next field | Enter:Sign up | Ctrl+T:Show password | Esc:Back",
        Screen::ForgotPassword => " Enter:Send link | Esc:Back",
        Screen::Dashboard => " Up/Down:Select | Enter:Take quiz | n:New quiz | d:Delete | r:Refresh | p:Profile | q:Quit",
        Screen::Generate => " Tab:Next field | Enter:Generate | Esc:Back",
        Screen::TakeQuiz(_) => match &state.take_quiz {
            Some(view) if view.result.is_some() => " Enter:Back to dashboard",
            Some(view) if view.attempt.is_some() => {
                " Up/Down:Move | Enter/Space:Select | Right:Next | Left:Back | s:Submit | Esc:Leave"
            }
            _ => " Esc:Back to dashboard",
        },
        Screen::Profile => " Tab:Next field | Enter:Save | Ctrl+L:Load avatar | Ctrl+O:Log out | Esc:Back",
    }
}

fn render_help_bar(frame: &mut Frame, area: ratatui::layout::Rect, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        help_text(state),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    mut view_state: ViewState,
) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();

    // 2. Restore the terminal before the default panic output.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    // 3. Async keyboard input and a ~30fps render interval
    let mut event_stream = EventStream::new();
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // 4. Main loop
    loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => {
                        if let Some(cmd) = apply_ui_update(&mut view_state, ui_update) {
                            let _ = cmd_tx.send(cmd).await;
                        }
                    }
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events are picked up by the next draw
                    }
                    Some(Err(e)) => {
                        warn!("terminal input error: {}", e);
                        break;
                    }
                    None => {
                        break;
                    }
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 5. Restore terminal
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
