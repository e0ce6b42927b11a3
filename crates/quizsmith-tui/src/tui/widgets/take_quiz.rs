// Quiz-taking widget: one question at a time with a progress gauge, then
// the results summary once the attempt is submitted.

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};
use ratatui::Frame;

use quizsmith_core::quiz::{QuizAttempt, QuizResult};

use crate::tui::{TakeQuizView, ViewState};

/// Render the quiz screen into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(view) = &state.take_quiz else {
        render_message(frame, area, "Loading quiz...", Color::Gray);
        return;
    };

    if let Some(result) = &view.result {
        render_results(frame, area, result);
    } else if let Some(error) = &view.error {
        render_message(frame, area, error, Color::Red);
    } else if let Some(attempt) = &view.attempt {
        render_question(frame, area, attempt, view);
    } else {
        render_message(frame, area, "Loading quiz...", Color::Gray);
    }
}

fn render_message(frame: &mut Frame, area: Rect, message: &str, color: Color) {
    let paragraph = Paragraph::new(Span::styled(message.to_string(), Style::default().fg(color)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

pub fn result_lines(result: &QuizResult) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            "Quiz Results",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Your Score: {}%", result.display_score()),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "You got {} out of {} questions correct.",
            result.correct_answers, result.total_questions
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to return to the dashboard.",
            Style::default().fg(Color::Gray),
        )),
    ]
}

fn render_results(frame: &mut Frame, area: Rect, result: &QuizResult) {
    let paragraph = Paragraph::new(result_lines(result))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_question(frame: &mut Frame, area: Rect, attempt: &QuizAttempt, view: &TakeQuizView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ", attempt.title()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [gauge_area, counter_area, question_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Min(1),
    ])
    .areas(inner);

    let percent = attempt.progress_percent().round().clamp(0.0, 100.0) as u16;
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray))
        .percent(percent);
    frame.render_widget(gauge, gauge_area);

    let counter = Paragraph::new(format!(
        "Question {} of {}",
        attempt.position() + 1,
        attempt.len()
    ))
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(counter, counter_area);

    let paragraph = Paragraph::new(question_lines(attempt, view.cursor)).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, question_area);
}

/// Question text followed by its numbered options. `>` marks the cursor,
/// `(*)` the chosen option.
pub fn question_lines(attempt: &QuizAttempt, cursor: usize) -> Vec<Line<'static>> {
    let Some(question) = attempt.current_question() else {
        return Vec::new();
    };
    let selected = attempt.selected();

    let mut lines = vec![
        Line::from(Span::styled(
            question.text.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, option) in question.options.iter().enumerate() {
        let chosen = selected == Some(i);
        let pointer = if i == cursor { "> " } else { "  " };
        let mark = if chosen { "(*)" } else { "( )" };
        let style = if chosen {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if i == cursor {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{pointer}{mark} {}. {}", i + 1, option.label),
            style,
        )));
    }

    if attempt.is_last() {
        lines.push(Line::from(""));
        let hint = if attempt.can_advance() {
            "Press s to submit your answers."
        } else {
            "Select an answer to submit."
        };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));
    }

    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
