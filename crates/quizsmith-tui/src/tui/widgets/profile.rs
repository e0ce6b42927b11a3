// Profile widget: account email, editable details and the current avatar.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use quizsmith_core::avatar::describe_avatar;

use crate::tui::ViewState;

/// Render the profile screen into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let [header_area, form_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(1)]).areas(area);

    let email = state.user().map(|u| u.email.as_str()).unwrap_or("");
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(" Email: ", Style::default().fg(Color::Gray)),
            Span::styled(
                email.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Avatar: ", Style::default().fg(Color::Gray)),
            Span::raw(avatar_summary(state.profile.avatar.as_deref())),
        ]),
    ]);
    frame.render_widget(header, header_area);

    let hint = "Ctrl+L loads the image at Avatar File.";
    super::form::render(frame, form_area, &state.profile.form, " Edit Profile ", &[hint]);
}

/// One-line description of the avatar data URI.
pub fn avatar_summary(avatar: Option<&str>) -> String {
    match avatar {
        None => "none".to_string(),
        Some(uri) => match describe_avatar(uri) {
            Some(info) => format!("{}, {} bytes", info.mime, info.bytes),
            None => "unrecognized image data".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
