// Report screen: the final validation report, scrollable.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::protocol::LlmStatus;
use crate::tui::ViewState;
use crate::wizard::report::ValidationReport;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = match (&state.report, state.report_status) {
        (_, LlmStatus::Pending) => vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Your advisor is writing the report...",
                Style::default().fg(Color::Yellow),
            )),
        ],
        (Some(report), _) => report_lines(report, state.report_status == LlmStatus::Fallback),
        (None, _) => vec![
            Line::from(""),
            Line::from("  No report yet. Finish the questionnaire first."),
        ],
    };

    let title = match state.advisor {
        Some(advisor) => format!(" Validation report from {} ", advisor.name()),
        None => " Validation report ".to_string(),
    };

    let block = Block::default().borders(Borders::ALL).title(title);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.report_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

/// Flatten the report into styled lines for the scrollable body.
fn report_lines(report: &ValidationReport, fallback: bool) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    if fallback {
        lines.push(Line::from(Span::styled(
            "Offline report. Retry later for a tailored assessment.",
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from(""));
    }

    lines.push(section("Summary"));
    lines.push(Line::from(report.summary.clone()));
    lines.push(Line::from(""));

    lines.push(section("Strengths"));
    for item in &report.strengths {
        lines.push(Line::from(format!("  + {item}")));
    }
    lines.push(Line::from(""));

    lines.push(section("Concerns"));
    for item in &report.concerns {
        lines.push(Line::from(format!("  - {item}")));
    }
    lines.push(Line::from(""));

    if !report.insights.is_empty() {
        lines.push(section("Insights"));
        lines.push(Line::from(report.insights.clone()));
        lines.push(Line::from(""));
    }

    lines.push(section("Next steps"));
    for (i, item) in report.next_steps.iter().enumerate() {
        lines.push(Line::from(format!("  {}. {item}", i + 1)));
    }

    lines
}
