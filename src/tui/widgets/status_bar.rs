// Top status bar: app name, chosen advisor, step progress, request status.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::{LlmStatus, Screen};
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![
        Span::styled(
            " IdeaForge ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        advisor_span(state),
    ];

    if let Some(progress) = progress_text(state) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(progress, Style::default().fg(Color::White)));
    }

    spans.push(Span::raw("  "));
    spans.push(llm_indicator(active_status(state)));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn advisor_span(state: &ViewState) -> Span<'static> {
    match state.advisor {
        Some(advisor) => Span::styled(advisor.name(), Style::default().fg(Color::Cyan)),
        None => Span::styled(
            "no advisor",
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        ),
    }
}

fn progress_text(state: &ViewState) -> Option<String> {
    match state.screen {
        Screen::Question => Some(format!("Step {}/{}", state.step, state.total_steps)),
        Screen::Review => Some("Review".to_string()),
        Screen::Report => Some("Report".to_string()),
        Screen::Welcome => None,
    }
}

/// The status that matters for the current screen: report generation on the
/// review and report screens, suggestions elsewhere.
fn active_status(state: &ViewState) -> LlmStatus {
    match state.screen {
        Screen::Review | Screen::Report => state.report_status,
        _ => state.suggestion_status,
    }
}

fn llm_indicator(status: LlmStatus) -> Span<'static> {
    match status {
        LlmStatus::Idle => Span::raw(""),
        LlmStatus::Pending => Span::styled(
            "● thinking",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        LlmStatus::Complete => Span::styled("● AI", Style::default().fg(Color::Green)),
        LlmStatus::Fallback => Span::styled("● offline", Style::default().fg(Color::Red)),
    }
}
