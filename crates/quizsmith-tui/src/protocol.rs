// Message types exchanged between the app orchestrator and the TUI.

use std::path::PathBuf;

use quizsmith_core::model::{QuizSummary, User};
use quizsmith_core::quiz::QuizAttempt;

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

/// Top-level screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    ForgotPassword,
    Dashboard,
    Generate,
    TakeQuiz(i64),
    Profile,
}

impl Screen {
    /// Protected screens redirect anonymous users to the login screen.
    pub fn requires_auth(self) -> bool {
        !matches!(
            self,
            Screen::Login | Screen::Register | Screen::ForgotPassword
        )
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Login => "Log In",
            Screen::Register => "Create Account",
            Screen::ForgotPassword => "Reset Password",
            Screen::Dashboard => "Dashboard",
            Screen::Generate => "Generate Quiz",
            Screen::TakeQuiz(_) => "Take Quiz",
            Screen::Profile => "Profile",
        }
    }
}

// ---------------------------------------------------------------------------
// TUI -> App
// ---------------------------------------------------------------------------

/// Commands sent from the TUI to the app orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Login { email: String, password: String },
    Register { email: String, password: String },
    Logout,
    RefreshQuizzes,
    DeleteQuiz(i64),
    GenerateQuiz { topic: String, num_questions: u32 },
    OpenQuiz(i64),
    /// Record a finished attempt's score. Scoring happens in the TUI.
    SaveScore { quiz_id: i64, score: f64 },
    LoadAvatar(PathBuf),
    SaveProfile {
        full_name: String,
        avatar: Option<String>,
    },
    Quit,
}

// ---------------------------------------------------------------------------
// App -> TUI
// ---------------------------------------------------------------------------

/// Updates pushed from the app orchestrator to the TUI.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    /// The persisted token has been checked; `None` means anonymous.
    AuthReady(Option<User>),
    LoggedIn(User),
    LoggedOut,
    /// The server rejected the token mid-session.
    SessionExpired,
    Registered,
    /// A network request started (`true`) or finished (`false`).
    Busy(bool),
    /// Inline error for the form on the current screen.
    FormError(String),
    /// Inline success message for the form on the current screen.
    Notice(String),
    /// Blocking message the user must dismiss.
    Alert(String),
    QuizzesLoaded(Vec<QuizSummary>),
    QuizzesFailed(String),
    QuizRemoved(i64),
    QuizGenerated { title: String },
    QuizLoaded(Box<QuizAttempt>),
    QuizLoadFailed(String),
    AvatarLoaded(String),
    ProfileSaved(User),
}
