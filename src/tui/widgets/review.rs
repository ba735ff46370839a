// Review screen: every answer listed before the report is generated.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::ViewState;
use crate::wizard::question;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut lines: Vec<Line> = vec![
        Line::from("Here is everything you told me. Press Enter to generate"),
        Line::from("your validation report, or Esc to go back and edit."),
        Line::from(""),
    ];

    for (question_id, display, ai_generated) in &state.answers {
        lines.extend(answer_lines(*question_id, display, *ai_generated));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Review your answers ");
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn answer_lines(question_id: u32, display: &str, ai_generated: bool) -> Vec<Line<'static>> {
    let question_text = question::question(question_id)
        .map(|q| q.text)
        .unwrap_or("(unknown question)");

    let mut header = vec![Span::styled(
        format!("{question_id}. {question_text}"),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if ai_generated {
        header.push(Span::styled(
            "  [AI]",
            Style::default().fg(Color::Magenta),
        ));
    }

    vec![
        Line::from(header),
        Line::from(Span::raw(format!("   {display}"))),
        Line::from(""),
    ]
}
