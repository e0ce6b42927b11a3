// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (typing, focus,
// selection, navigation between screens).

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::protocol::{Screen, UserCommand};
use super::form::{self, Form};
use super::{Dialog, PendingAction, ViewState};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode (escape hatch)
    if is_ctrl(&key_event, 'c') {
        view_state.should_quit = true;
        return Some(UserCommand::Quit);
    }

    // Dialogs block everything else
    if view_state.dialog.is_some() {
        return handle_dialog(key_event, view_state);
    }

    // Nothing is interactive until the session is known
    if view_state.auth == super::AuthView::Loading {
        return None;
    }

    match view_state.screen {
        Screen::Login => handle_login(key_event, view_state),
        Screen::Register => handle_register(key_event, view_state),
        Screen::ForgotPassword => handle_forgot_password(key_event, view_state),
        Screen::Dashboard => handle_dashboard(key_event, view_state),
        Screen::Generate => handle_generate(key_event, view_state),
        Screen::TakeQuiz(_) => handle_take_quiz(key_event, view_state),
        Screen::Profile => handle_profile(key_event, view_state),
    }
}

fn is_ctrl(key_event: &KeyEvent, c: char) -> bool {
    key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char(c)
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

/// Handle key events while a dialog is open.
///
/// - Confirm: `y` or Enter accepts, `n` or Esc cancels
/// - Alert: Enter or Esc dismisses
/// - All other keys are blocked
fn handle_dialog(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match view_state.dialog.clone()? {
        Dialog::Alert(_) => {
            if matches!(key_event.code, KeyCode::Enter | KeyCode::Esc) {
                view_state.dialog = None;
            }
            None
        }
        Dialog::Confirm(action) => match key_event.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                view_state.dialog = None;
                confirm(action, view_state)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                view_state.dialog = None;
                None
            }
            _ => None,
        },
    }
}

/// Carry out an accepted confirmation.
fn confirm(action: PendingAction, view_state: &mut ViewState) -> Option<UserCommand> {
    match action {
        PendingAction::Quit => {
            view_state.should_quit = true;
            Some(UserCommand::Quit)
        }
        PendingAction::DeleteQuiz(quiz_id) => Some(UserCommand::DeleteQuiz(quiz_id)),
        PendingAction::Logout => Some(UserCommand::Logout),
        PendingAction::SubmitQuiz => {
            let view = view_state.take_quiz.as_mut()?;
            let attempt = view.attempt.as_ref()?;
            let result = attempt.finish();
            let quiz_id = attempt.quiz_id();
            view.result = Some(result);
            Some(UserCommand::SaveScore {
                quiz_id,
                score: result.score,
            })
        }
    }
}

fn ask(view_state: &mut ViewState, action: PendingAction) {
    view_state.dialog = Some(Dialog::Confirm(action));
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// What a key did to a form.
enum FormKey {
    Submit,
    Handled,
    Unhandled,
}

/// Shared editing keys: Tab/Shift+Tab/Up/Down move focus, Ctrl+T toggles
/// secret visibility, printable characters type. Enter on the last field
/// submits; elsewhere it moves to the next field.
fn edit_form(key_event: &KeyEvent, form: &mut Form) -> FormKey {
    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
    match key_event.code {
        KeyCode::Tab | KeyCode::Down => {
            form.focus_next();
            FormKey::Handled
        }
        KeyCode::BackTab | KeyCode::Up => {
            form.focus_prev();
            FormKey::Handled
        }
        KeyCode::Enter => {
            if form.is_last_field() {
                FormKey::Submit
            } else {
                form.focus_next();
                FormKey::Handled
            }
        }
        KeyCode::Backspace => {
            form.backspace();
            FormKey::Handled
        }
        KeyCode::Char('t') if ctrl => {
            form.toggle_reveal();
            FormKey::Handled
        }
        KeyCode::Char(c) if !ctrl => {
            form.insert_char(c);
            FormKey::Handled
        }
        _ => FormKey::Unhandled,
    }
}

/// Message for a form with a blank field.
fn blank_field_error(label: &str) -> String {
    format!("{label} is required.")
}

fn handle_login(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    if is_ctrl(&key_event, 'r') {
        view_state.login.clear_messages();
        return view_state.navigate(Screen::Register);
    }
    if is_ctrl(&key_event, 'f') {
        view_state.login.clear_messages();
        return view_state.navigate(Screen::ForgotPassword);
    }
    if key_event.code == KeyCode::Esc {
        ask(view_state, PendingAction::Quit);
        return None;
    }

    match edit_form(&key_event, &mut view_state.login) {
        FormKey::Submit => {
            if view_state.busy {
                return None;
            }
            let f = &mut view_state.login;
            if let Some(label) = f.first_blank() {
                f.error = Some(blank_field_error(label));
                return None;
            }
            f.clear_messages();
            Some(UserCommand::Login {
                email: f.value(form::EMAIL).trim().to_string(),
                password: f.value(form::PASSWORD).to_string(),
            })
        }
        FormKey::Handled | FormKey::Unhandled => None,
    }
}

fn handle_register(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    if key_event.code == KeyCode::Esc {
        view_state.register.clear_messages();
        return view_state.navigate(Screen::Login);
    }

    match edit_form(&key_event, &mut view_state.register) {
        FormKey::Submit => {
            if view_state.busy {
                return None;
            }
            let f = &mut view_state.register;
            if let Some(label) = f.first_blank() {
                f.error = Some(blank_field_error(label));
                return None;
            }
            if f.value(form::PASSWORD) != f.value(form::CONFIRM_PASSWORD) {
                f.error = Some("Passwords do not match".to_string());
                return None;
            }
            f.clear_messages();
            Some(UserCommand::Register {
                email: f.value(form::EMAIL).trim().to_string(),
                password: f.value(form::PASSWORD).to_string(),
            })
        }
        FormKey::Handled | FormKey::Unhandled => None,
    }
}

/// Password reset is simulated locally: submitting only shows the
/// confirmation.
fn handle_forgot_password(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    if key_event.code == KeyCode::Esc {
        return view_state.navigate(Screen::Login);
    }
    if view_state.forgot_sent {
        if key_event.code == KeyCode::Enter {
            return view_state.navigate(Screen::Login);
        }
        return None;
    }

    if let FormKey::Submit = edit_form(&key_event, &mut view_state.forgot) {
        let f = &mut view_state.forgot;
        if let Some(label) = f.first_blank() {
            f.error = Some(blank_field_error(label));
        } else {
            f.clear_messages();
            view_state.forgot_sent = true;
        }
    }
    None
}

fn handle_generate(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    if key_event.code == KeyCode::Esc {
        if view_state.busy {
            return None;
        }
        return view_state.navigate(Screen::Dashboard);
    }

    // The count field only takes digits.
    if view_state.generate.focus == form::QUESTION_COUNT {
        if let KeyCode::Char(c) = key_event.code {
            if !c.is_ascii_digit() {
                return None;
            }
        }
    }

    match edit_form(&key_event, &mut view_state.generate) {
        FormKey::Submit => {
            if view_state.busy {
                return None;
            }
            let max = view_state.max_questions;
            let f = &mut view_state.generate;
            let topic = f.value(form::TOPIC).trim().to_string();
            let count = f.value(form::QUESTION_COUNT).trim().parse::<u32>().unwrap_or(0);
            if let Err(message) = crate::app::validate_generate(&topic, count, max) {
                f.error = Some(message);
                return None;
            }
            f.clear_messages();
            Some(UserCommand::GenerateQuiz {
                topic,
                num_questions: count,
            })
        }
        FormKey::Handled | FormKey::Unhandled => None,
    }
}

fn handle_profile(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    if key_event.code == KeyCode::Esc {
        return view_state.navigate(Screen::Dashboard);
    }
    if is_ctrl(&key_event, 'o') {
        ask(view_state, PendingAction::Logout);
        return None;
    }
    if is_ctrl(&key_event, 'l') {
        let path = view_state.profile.form.value(form::AVATAR_PATH).trim().to_string();
        if path.is_empty() {
            view_state.profile.form.error = Some("Enter the path of an image file first.".into());
            return None;
        }
        return Some(UserCommand::LoadAvatar(expand_home(&path)));
    }

    match edit_form(&key_event, &mut view_state.profile.form) {
        FormKey::Submit => {
            if view_state.busy {
                return None;
            }
            view_state.profile.form.clear_messages();
            Some(UserCommand::SaveProfile {
                full_name: view_state.profile.form.value(form::FULL_NAME).to_string(),
                avatar: view_state.profile.avatar.clone(),
            })
        }
        FormKey::Handled | FormKey::Unhandled => None,
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    path.strip_prefix("~/")
        .and_then(|rest| directories::BaseDirs::new().map(|d| d.home_dir().join(rest)))
        .unwrap_or_else(|| PathBuf::from(path))
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

fn handle_dashboard(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.dashboard.select_prev();
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_state.dashboard.select_next();
            None
        }
        KeyCode::Enter => {
            let quiz_id = view_state.dashboard.selected_quiz()?.id;
            view_state.navigate(Screen::TakeQuiz(quiz_id))
        }
        KeyCode::Char('n') | KeyCode::Char('g') => view_state.navigate(Screen::Generate),
        KeyCode::Char('d') | KeyCode::Delete => {
            if view_state.busy {
                return None;
            }
            let quiz_id = view_state.dashboard.selected_quiz()?.id;
            ask(view_state, PendingAction::DeleteQuiz(quiz_id));
            None
        }
        KeyCode::Char('r') => {
            if view_state.busy {
                return None;
            }
            view_state.dashboard.loading = true;
            Some(UserCommand::RefreshQuizzes)
        }
        KeyCode::Char('p') => view_state.navigate(Screen::Profile),
        KeyCode::Char('q') | KeyCode::Esc => {
            ask(view_state, PendingAction::Quit);
            None
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Taking a quiz
// ---------------------------------------------------------------------------

fn handle_take_quiz(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let Some(view) = view_state.take_quiz.as_mut() else {
        return view_state.navigate(Screen::Dashboard);
    };

    // Results, loading and error states only offer the way back.
    if view.result.is_some() || view.attempt.is_none() {
        return match key_event.code {
            KeyCode::Enter | KeyCode::Esc => view_state.navigate(Screen::Dashboard),
            _ => None,
        };
    }

    let attempt = view.attempt.as_mut()?;
    let option_count = attempt
        .current_question()
        .map(|q| q.options.len())
        .unwrap_or(0);

    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view.cursor = view.cursor.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if view.cursor + 1 < option_count {
                view.cursor += 1;
            }
            None
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            attempt.select(view.cursor);
            None
        }
        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as usize) - ('1' as usize);
            if attempt.select(index) {
                view.cursor = index;
            }
            None
        }
        KeyCode::Right | KeyCode::Char('n') => {
            if attempt.next() {
                view.sync_cursor();
            }
            None
        }
        KeyCode::Left | KeyCode::Char('b') => {
            if attempt.back() {
                view.sync_cursor();
            }
            None
        }
        KeyCode::Char('s') => {
            if attempt.is_last() && attempt.can_advance() && !view_state.busy {
                ask(view_state, PendingAction::SubmitQuiz);
            }
            None
        }
        KeyCode::Esc => view_state.navigate(Screen::Dashboard),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
