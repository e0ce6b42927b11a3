// Form widget: labelled input fields with inline error and notice lines.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::form::Form;
use crate::tui::layout::centered_rect;

const FORM_WIDTH: u16 = 64;

/// Render `form` in a titled box centered in `area`, followed by `hints`.
pub fn render(frame: &mut Frame, area: Rect, form: &Form, title: &str, hints: &[&str]) {
    let lines = form_lines(form, hints);
    let height = lines.len() as u16 + 2;
    let form_area = centered_rect(FORM_WIDTH, height, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, form_area);
}

/// Lines of the form body: one label and one value line per field, then
/// messages and hints.
pub fn form_lines(form: &Form, hints: &[&str]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let label_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(field.label, label_style)));

        let marker = if focused { "> " } else { "  " };
        let cursor = if focused { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{}{}", form.display_value(i), cursor),
                Style::default().fg(Color::White),
            ),
        ]));
    }

    if let Some(error) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(notice) = &form.notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Green),
        )));
    }

    if !hints.is_empty() {
        lines.push(Line::from(""));
        for hint in hints {
            lines.push(Line::from(Span::styled(
                hint.to_string(),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::form::{EMAIL, PASSWORD};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn password_is_masked() {
        let mut form = Form::login();
        form.set_value(EMAIL, "ada@example.com");
        form.set_value(PASSWORD, "secret");
        let texts: Vec<String> = form_lines(&form, &[]).iter().map(line_text).collect();
        assert_eq!(texts[1], "> ada@example.com_");
        assert_eq!(texts[3], "  ******");
    }

    #[test]
    fn error_and_hints_follow_fields() {
        let mut form = Form::login();
        form.error = Some("Failed to log in.".into());
        let texts: Vec<String> = form_lines(&form, &["Ctrl+R to register."])
            .iter()
            .map(line_text)
            .collect();
        assert!(texts.contains(&"Failed to log in.".to_string()));
        assert_eq!(texts.last().map(String::as_str), Some("Ctrl+R to register."));
    }

    #[test]
    fn error_is_red_and_notice_green() {
        let mut form = Form::profile();
        form.notice = Some("Profile updated successfully!".into());
        let lines = form_lines(&form, &[]);
        let notice = lines.last().unwrap();
        assert_eq!(notice.spans[0].style.fg, Some(Color::Green));

        form.notice = None;
        form.error = Some("Failed to update profile.".into());
        let lines = form_lines(&form, &[]);
        assert_eq!(lines.last().unwrap().spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn render_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(80, 20);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let form = Form::register();
        terminal
            .draw(|frame| render(frame, frame.area(), &form, " Create Account ", &["hint"]))
            .unwrap();
    }
}
