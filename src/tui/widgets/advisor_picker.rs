// Welcome screen: pick the advisor persona that will run the session.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;
use crate::wizard::advisor::AdvisorId;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            "Welcome to IdeaForge.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("Answer eight short questions about your idea and get a"),
        Line::from("structured validation report in your advisor's voice."),
        Line::from(""),
        Line::from("Who should guide you?"),
        Line::from(""),
    ];

    for (idx, advisor) in AdvisorId::ALL.iter().enumerate() {
        lines.push(advisor_line(idx, *advisor, idx == state.choice_index));
        lines.push(Line::from(Span::styled(
            format!("     {}", advisor.description()),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Choose your advisor ");
    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn advisor_line(idx: usize, advisor: AdvisorId, selected: bool) -> Line<'static> {
    let marker = if selected { "▸" } else { " " };
    let name_style = if selected {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(
            format!(" {marker} {}. {}", idx + 1, advisor.name()),
            name_style,
        ),
        Span::styled(
            format!("  {}", advisor.tagline()),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ),
    ])
}
