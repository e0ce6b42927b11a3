// Status bar widget: app name, current screen, signed-in user.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::{AuthView, ViewState};

/// Render the status bar into the given area.
///
/// Layout: [app name] | [screen title] | [user] [busy indicator]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![
        Span::styled(
            " QuizSmith ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("| ", Style::default().fg(Color::Gray)),
        Span::styled(state.screen.title(), Style::default().fg(Color::White)),
        Span::styled(" | ", Style::default().fg(Color::Gray)),
    ];

    let (label, color) = user_label(&state.auth);
    spans.push(Span::styled(label, Style::default().fg(color)));

    if state.busy {
        spans.push(Span::styled(
            "  Working...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Who is signed in, and the color to show it in.
pub fn user_label(auth: &AuthView) -> (String, Color) {
    match auth {
        AuthView::Loading => ("Checking session...".to_string(), Color::Gray),
        AuthView::Anonymous => ("Not signed in".to_string(), Color::Red),
        AuthView::Authenticated(user) => (user.display_name().to_string(), Color::Green),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
