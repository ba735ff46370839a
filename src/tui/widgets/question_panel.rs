// Question screen: the active question with its input widget.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::protocol::LlmStatus;
use crate::tui::ViewState;
use crate::wizard::question::InputKind;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(question) = state.current_question() else {
        return;
    };

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            question.guidance,
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
    ];
    lines.extend(input_lines(state, &question.kind));

    if state.suggestion_status == LlmStatus::Pending {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Fetching suggestions...",
            Style::default().fg(Color::Yellow),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", question.text));
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// The input portion of the panel, per question kind.
fn input_lines(state: &ViewState, kind: &InputKind) -> Vec<Line<'static>> {
    match kind {
        InputKind::Text => {
            let mut spans = vec![
                Span::raw("> "),
                Span::raw(state.text_input.clone()),
                Span::styled("█", Style::default().fg(Color::Cyan)),
            ];
            if state.draft_from_suggestion {
                spans.push(Span::styled(
                    "  [AI]",
                    Style::default().fg(Color::Magenta),
                ));
            }
            vec![Line::from(spans)]
        }

        InputKind::SingleChoice { options } => options
            .iter()
            .enumerate()
            .map(|(idx, option)| option_line(option, idx == state.choice_index, None))
            .collect(),

        InputKind::MultiSelect { options } => options
            .iter()
            .enumerate()
            .map(|(idx, option)| {
                option_line(
                    option,
                    idx == state.choice_index,
                    Some(state.multi_selected.contains(&idx)),
                )
            })
            .collect(),

        InputKind::Slider { min, max, label } => {
            vec![
                Line::from(slider_line(state.slider_value, *min, *max)),
                Line::from(""),
                Line::from(Span::styled(
                    format!("{} ({label})", state.slider_value),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
            ]
        }

        InputKind::Toggle { on, off } => {
            let (on_style, off_style) = if state.toggle_on {
                (
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::Gray),
                )
            } else {
                (
                    Style::default().fg(Color::Gray),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )
            };
            vec![Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("( ) {on}"), on_style),
                Span::raw("   "),
                Span::styled(format!("( ) {off}"), off_style),
            ])]
        }
    }
}

fn option_line(option: &str, highlighted: bool, checked: Option<bool>) -> Line<'static> {
    let marker = if highlighted { "▸" } else { " " };
    let checkbox = match checked {
        Some(true) => "[x] ",
        Some(false) => "[ ] ",
        None => "",
    };
    let style = if highlighted {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(Span::styled(format!(" {marker} {checkbox}{option}"), style))
}

/// A textual slider track: filled up to the current value.
fn slider_line(value: u8, min: u8, max: u8) -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw(format!("  {min} "))];
    for step in min..=max {
        if step <= value {
            spans.push(Span::styled("━", Style::default().fg(Color::Cyan)));
        } else {
            spans.push(Span::styled("─", Style::default().fg(Color::DarkGray)));
        }
    }
    spans.push(Span::raw(format!(" {max}")));
    spans
}
