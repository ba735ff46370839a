// TUI wizard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors relevant parts of the application
// state. The app orchestrator pushes `UiUpdate` messages over an mpsc channel;
// the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashSet;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::protocol::{AppSnapshot, LlmStatus, Screen, UiUpdate, UserCommand};
use crate::wizard::advisor::AdvisorId;
use crate::wizard::question::{self, AnswerValue, InputKind};
use crate::wizard::report::ValidationReport;

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
///
/// Updated incrementally via `UiUpdate` messages from the app orchestrator.
/// The `render_frame` function reads this struct to draw the wizard.
pub struct ViewState {
    pub screen: Screen,
    pub advisor: Option<AdvisorId>,
    /// Active question id (1-based).
    pub step: u32,
    pub total_steps: u32,
    /// `(question_id, display string, ai_generated)` for the review screen.
    pub answers: Vec<(u32, String, bool)>,

    /// Free-text input buffer for the active question.
    pub text_input: String,
    /// Whether `text_input` was taken unedited from an AI suggestion.
    pub draft_from_suggestion: bool,
    /// Highlighted row for choice lists (advisor picker, single choice,
    /// multi-select).
    pub choice_index: usize,
    /// Toggled rows for multi-select questions.
    pub multi_selected: HashSet<usize>,
    /// Current slider position.
    pub slider_value: u8,
    /// Current toggle position.
    pub toggle_on: bool,

    /// Suggestion options shown in the picker overlay.
    pub suggestions: Vec<String>,
    pub suggestions_fallback: bool,
    pub suggestions_open: bool,
    pub suggestion_index: usize,
    pub suggestion_status: LlmStatus,

    pub report: Option<ValidationReport>,
    pub report_status: LlmStatus,
    pub report_scroll: u16,

    /// Transient one-line notice shown above the help bar.
    pub notice: Option<String>,
    /// Whether the quit confirmation dialog is showing.
    pub confirm_quit: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            screen: Screen::Welcome,
            advisor: None,
            step: 1,
            total_steps: question::total_steps(),
            answers: Vec::new(),
            text_input: String::new(),
            draft_from_suggestion: false,
            choice_index: 0,
            multi_selected: HashSet::new(),
            slider_value: 1,
            toggle_on: false,
            suggestions: Vec::new(),
            suggestions_fallback: false,
            suggestions_open: false,
            suggestion_index: 0,
            suggestion_status: LlmStatus::Idle,
            report: None,
            report_status: LlmStatus::Idle,
            report_scroll: 0,
            notice: None,
            confirm_quit: false,
        }
    }
}

impl ViewState {
    /// The question catalog entry for the active step, if any.
    pub fn current_question(&self) -> Option<&'static question::Question> {
        question::question(self.step)
    }

    /// Apply a full state snapshot from the app orchestrator.
    ///
    /// Re-seeds the input widgets from the question the snapshot lands on,
    /// pre-filling any previously submitted answer so navigating back shows
    /// what was entered.
    pub fn apply_snapshot(&mut self, snapshot: AppSnapshot) {
        self.screen = snapshot.screen;
        self.advisor = snapshot.advisor;
        self.step = snapshot.step;
        self.total_steps = snapshot.total_steps;
        self.answers = snapshot.answers;

        self.suggestions.clear();
        self.suggestions_open = false;
        self.suggestion_index = 0;
        self.draft_from_suggestion = false;

        self.reset_inputs();
        if let Some(q) = self.current_question() {
            if let Some(value) = snapshot.current_answer {
                self.seed_inputs(&q.kind, value);
            } else if let InputKind::Slider { min, max, .. } = q.kind {
                self.slider_value = min + (max - min) / 2;
            }
        }
    }

    fn reset_inputs(&mut self) {
        self.text_input.clear();
        self.choice_index = 0;
        self.multi_selected.clear();
        self.slider_value = 1;
        self.toggle_on = false;
    }

    fn seed_inputs(&mut self, kind: &InputKind, value: AnswerValue) {
        match (kind, value) {
            (InputKind::Text, AnswerValue::Text(text)) => {
                self.text_input = text;
            }
            (InputKind::SingleChoice { options }, AnswerValue::Choice(choice)) => {
                if let Some(idx) = options.iter().position(|o| *o == choice) {
                    self.choice_index = idx;
                }
            }
            (InputKind::MultiSelect { options }, AnswerValue::Multi(picked)) => {
                for (idx, option) in options.iter().enumerate() {
                    if picked.iter().any(|p| p == option) {
                        self.multi_selected.insert(idx);
                    }
                }
            }
            (InputKind::Slider { .. }, AnswerValue::Scale(n)) => {
                self.slider_value = n;
            }
            (InputKind::Toggle { .. }, AnswerValue::Flag(flag)) => {
                self.toggle_on = flag;
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            state.apply_snapshot(*snapshot);
        }
        UiUpdate::Suggestions {
            question_id,
            options,
            fallback,
        } => {
            // Results for a question the user already moved past are stale.
            if question_id != state.step || state.screen != Screen::Question {
                return;
            }
            state.suggestions = options;
            state.suggestions_fallback = fallback;
            state.suggestions_open = !state.suggestions.is_empty();
            state.suggestion_index = 0;
        }
        UiUpdate::SuggestionStatus(status) => {
            state.suggestion_status = status;
        }
        UiUpdate::ReportStatus(status) => {
            state.report_status = status;
        }
        UiUpdate::Report(report) => {
            state.report = Some(*report);
            state.report_scroll = 0;
        }
        UiUpdate::ReportExported(path) => {
            state.notice = Some(format!("Report saved to {path}"));
        }
        UiUpdate::Notice(message) => {
            state.notice = Some(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Frame rendering
// ---------------------------------------------------------------------------

/// Render the complete wizard frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);

    match state.screen {
        Screen::Welcome => widgets::advisor_picker::render(frame, layout.body, state),
        Screen::Question => widgets::question_panel::render(frame, layout.body, state),
        Screen::Review => widgets::review::render(frame, layout.body, state),
        Screen::Report => widgets::report::render(frame, layout.body, state),
    }

    render_notice(frame, &layout, state);
    render_help_bar(frame, &layout, state);

    if state.suggestions_open {
        widgets::suggestions::render(frame, frame.area(), state);
    }
    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

fn render_notice(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let Some(ref notice) = state.notice else {
        return;
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!(" {notice}"),
        Style::default().fg(Color::Yellow),
    )));
    frame.render_widget(paragraph, layout.notice);
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let text = help_text(state);
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

/// Keyboard hints for the active screen and input kind.
fn help_text(state: &ViewState) -> &'static str {
    if state.confirm_quit {
        return " y:Quit | n:Cancel";
    }
    if state.suggestions_open {
        return " Up/Down:Select | Enter:Use suggestion | Esc:Dismiss";
    }
    match state.screen {
        Screen::Welcome => " Up/Down:Select | Enter:Choose advisor | q:Quit",
        Screen::Question => match state.current_question().map(|q| &q.kind) {
            Some(InputKind::Text) => {
                " Type your answer | Enter:Submit | Tab:AI suggestions | Esc:Back | Ctrl+C:Quit"
            }
            Some(InputKind::SingleChoice { .. }) => {
                " Up/Down:Select | Enter:Submit | Esc:Back | q:Quit"
            }
            Some(InputKind::MultiSelect { .. }) => {
                " Up/Down:Move | Space:Toggle | Enter:Submit | Esc:Back | q:Quit"
            }
            Some(InputKind::Slider { .. }) => {
                " Left/Right:Adjust | Enter:Submit | Esc:Back | q:Quit"
            }
            Some(InputKind::Toggle { .. }) => {
                " Space:Flip | Enter:Submit | Esc:Back | q:Quit"
            }
            None => " Esc:Back | q:Quit",
        },
        Screen::Review => " Enter:Generate report | Esc:Edit answers | s:Start over | q:Quit",
        Screen::Report => " e:Export | Up/Down:Scroll | Esc:Review | s:Start over | q:Quit",
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Restore the terminal on crash. The original hook is chained after ours.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => {
                        apply_ui_update(&mut view_state, ui_update);
                    }
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let is_quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if is_quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events need no handling; ratatui
                        // picks up the new size on the next draw.
                    }
                    Some(Err(_)) | None => {
                        break;
                    }
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
