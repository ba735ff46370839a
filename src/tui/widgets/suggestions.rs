// Suggestion picker overlay: AI (or fallback) phrasing options for the
// active free-text question.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::layout::centered_rect;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let height = (state.suggestions.len() as u16).saturating_add(4).min(area.height);
    let dialog = centered_rect(64, height, area);

    frame.render_widget(Clear, dialog);

    let mut lines: Vec<Line> = vec![Line::from("")];
    for (idx, suggestion) in state.suggestions.iter().enumerate() {
        lines.push(suggestion_line(suggestion, idx == state.suggestion_index));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(title(state.suggestions_fallback));
    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, dialog);
}

fn title(fallback: bool) -> &'static str {
    if fallback {
        " Suggestions (offline) "
    } else {
        " AI suggestions "
    }
}

fn suggestion_line(text: &str, selected: bool) -> Line<'static> {
    let marker = if selected { "▸" } else { " " };
    let style = if selected {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(Span::styled(format!(" {marker} {text}"), style))
}
