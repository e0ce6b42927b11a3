// Dashboard widget: greeting and the table of the user's quizzes.
//
// Columns: Title, Description, Topic, Created, Best score. The selected
// row is highlighted; Enter on it opens the quiz.

use chrono::{DateTime, NaiveDateTime};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use quizsmith_core::model::QuizSummary;

use crate::tui::ViewState;

pub const EMPTY_MESSAGE: &str = "You haven't created any quizzes yet.";

/// Render the dashboard into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let [greeting_area, body_area] =
        Layout::vertical([Constraint::Length(2), Constraint::Min(1)]).areas(area);

    let name = state.user().map(|u| u.display_name()).unwrap_or("");
    let greeting = Paragraph::new(Line::from(Span::styled(
        format!(" Welcome, {name}!"),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(greeting, greeting_area);

    let dashboard = &state.dashboard;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Your Quizzes ({}) ", dashboard.quizzes.len()));

    if dashboard.loading && dashboard.quizzes.is_empty() {
        let paragraph = Paragraph::new("Loading your quizzes...")
            .style(Style::default().fg(Color::Gray))
            .block(block);
        frame.render_widget(paragraph, body_area);
        return;
    }
    if let Some(error) = &dashboard.error {
        let paragraph = Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::Red)))
            .block(block);
        frame.render_widget(paragraph, body_area);
        return;
    }
    if dashboard.quizzes.is_empty() {
        let lines = vec![
            Line::from(EMPTY_MESSAGE),
            Line::from(Span::styled(
                "Press n to generate your first quiz.",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), body_area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Title"),
        Cell::from("Description"),
        Cell::from("Topic"),
        Cell::from("Created"),
        Cell::from("Best"),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = dashboard
        .quizzes
        .iter()
        .map(|quiz| {
            Row::new(vec![
                Cell::from(quiz.title.clone()),
                Cell::from(quiz_description(quiz)),
                Cell::from(format!("Topic: {}", quiz.title)),
                Cell::from(quiz.created_at.as_deref().map(format_created).unwrap_or_default()),
                Cell::from(format_best_score(quiz.best_score)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(14),
        Constraint::Min(20),
        Constraint::Min(14),
        Constraint::Length(12),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut table_state = TableState::default().with_selected(Some(dashboard.selected));
    frame.render_stateful_widget(table, body_area, &mut table_state);
}

pub fn quiz_description(quiz: &QuizSummary) -> String {
    match quiz.description.as_deref() {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => "AI Generated Quiz".to_string(),
    }
}

/// Calendar date of a server timestamp. Unparseable values are shown as-is.
pub fn format_created(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%b %-d, %Y").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%b %-d, %Y").to_string();
    }
    raw.to_string()
}

pub fn format_best_score(best: Option<f64>) -> String {
    match best {
        Some(score) => format!("Best: {score:.0}%"),
        None => "Not taken".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
