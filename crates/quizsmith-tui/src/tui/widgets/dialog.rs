// Modal dialog overlay: confirmations and alerts.
//
// Renders a centered box on top of the main layout whenever
// `ViewState::dialog` is set.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::layout::centered_rect;
use crate::tui::Dialog;

const DIALOG_WIDTH: u16 = 52;
const DIALOG_HEIGHT: u16 = 7;

/// Render `dialog` centered within `area`.
pub fn render(frame: &mut Frame, area: Rect, dialog: &Dialog) {
    let dialog_area = centered_rect(DIALOG_WIDTH, DIALOG_HEIGHT, area);

    // Clear the area behind the dialog so it renders cleanly on top
    frame.render_widget(Clear, dialog_area);

    let (title, color, message, keys) = match dialog {
        Dialog::Confirm(action) => (
            " Confirm ",
            Color::Yellow,
            action.prompt().to_string(),
            Line::from(vec![
                Span::raw("("),
                Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw("/"),
                Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::raw(")"),
            ]),
        ),
        Dialog::Alert(message) => (
            " Notice ",
            Color::Red,
            message.clone(),
            Line::from(Span::styled("Enter to dismiss", Style::default().fg(Color::Gray))),
        ),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(vec![Line::from(message), Line::from(""), keys])
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(Color::Black));

    frame.render_widget(paragraph, dialog_area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
