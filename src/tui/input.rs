// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (cursor movement,
// text editing, toggles).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::ViewState;
use crate::protocol::{Screen, UserCommand};
use crate::wizard::advisor::AdvisorId;
use crate::wizard::question::{AnswerValue, InputKind};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator (answer submission, suggestion request, quit). Returns
/// `None` when the key press was handled locally by mutating `ViewState`
/// (cursor movement, text editing, toggles).
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress; ignoring
    // non-Press events prevents double-processing.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode (escape hatch)
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    // Quit confirmation mode: only y/q confirm, n/Esc cancel, everything else blocked
    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    // Any keypress clears the previous notice line.
    view_state.notice = None;

    // Suggestion picker overlay captures navigation until dismissed.
    if view_state.suggestions_open {
        return handle_suggestion_picker(key_event, view_state);
    }

    match view_state.screen {
        Screen::Welcome => handle_welcome(key_event, view_state),
        Screen::Question => handle_question(key_event, view_state),
        Screen::Review => handle_review(key_event, view_state),
        Screen::Report => handle_report(key_event, view_state),
    }
}

/// Handle key events while in quit confirmation mode.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None, // Block all other input
    }
}

/// Handle key events while the suggestion picker overlay is open.
///
/// Enter copies the highlighted suggestion into the text input and marks it
/// AI-generated; any later edit clears that mark.
fn handle_suggestion_picker(
    key_event: KeyEvent,
    view_state: &mut ViewState,
) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.suggestion_index = view_state.suggestion_index.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if view_state.suggestion_index + 1 < view_state.suggestions.len() {
                view_state.suggestion_index += 1;
            }
            None
        }
        KeyCode::Enter => {
            if let Some(text) = view_state.suggestions.get(view_state.suggestion_index) {
                view_state.text_input = text.clone();
                view_state.draft_from_suggestion = true;
            }
            view_state.suggestions_open = false;
            None
        }
        KeyCode::Esc => {
            view_state.suggestions_open = false;
            None
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Per-screen handlers
// ---------------------------------------------------------------------------

fn handle_welcome(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let advisor_count = AdvisorId::ALL.len();
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.choice_index = view_state.choice_index.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if view_state.choice_index + 1 < advisor_count {
                view_state.choice_index += 1;
            }
            None
        }
        KeyCode::Char(c @ '1'..='9') => {
            let idx = (c as usize) - ('1' as usize);
            if idx < advisor_count {
                view_state.choice_index = idx;
                return Some(UserCommand::SelectAdvisor(AdvisorId::ALL[idx]));
            }
            None
        }
        KeyCode::Enter => Some(UserCommand::SelectAdvisor(
            AdvisorId::ALL[view_state.choice_index],
        )),
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn handle_question(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let question = view_state.current_question()?;

    // Esc backs out of the question regardless of input kind.
    if key_event.code == KeyCode::Esc {
        return Some(UserCommand::Back);
    }

    match &question.kind {
        InputKind::Text => handle_text_input(key_event, view_state),

        InputKind::SingleChoice { options } => match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => {
                view_state.choice_index = view_state.choice_index.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if view_state.choice_index + 1 < options.len() {
                    view_state.choice_index += 1;
                }
                None
            }
            KeyCode::Enter => Some(UserCommand::SubmitAnswer {
                question_id: question.id,
                value: AnswerValue::Choice(options[view_state.choice_index].to_string()),
                ai_generated: false,
            }),
            KeyCode::Char('q') => {
                view_state.confirm_quit = true;
                None
            }
            _ => None,
        },

        InputKind::MultiSelect { options } => match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => {
                view_state.choice_index = view_state.choice_index.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if view_state.choice_index + 1 < options.len() {
                    view_state.choice_index += 1;
                }
                None
            }
            KeyCode::Char(' ') => {
                if !view_state.multi_selected.remove(&view_state.choice_index) {
                    view_state.multi_selected.insert(view_state.choice_index);
                }
                None
            }
            KeyCode::Enter => {
                let picked: Vec<String> = options
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| view_state.multi_selected.contains(idx))
                    .map(|(_, option)| option.to_string())
                    .collect();
                Some(UserCommand::SubmitAnswer {
                    question_id: question.id,
                    value: AnswerValue::Multi(picked),
                    ai_generated: false,
                })
            }
            KeyCode::Char('q') => {
                view_state.confirm_quit = true;
                None
            }
            _ => None,
        },

        InputKind::Slider { min, max, .. } => match key_event.code {
            KeyCode::Left | KeyCode::Char('h') => {
                if view_state.slider_value > *min {
                    view_state.slider_value -= 1;
                }
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if view_state.slider_value < *max {
                    view_state.slider_value += 1;
                }
                None
            }
            KeyCode::Enter => Some(UserCommand::SubmitAnswer {
                question_id: question.id,
                value: AnswerValue::Scale(view_state.slider_value),
                ai_generated: false,
            }),
            KeyCode::Char('q') => {
                view_state.confirm_quit = true;
                None
            }
            _ => None,
        },

        InputKind::Toggle { .. } => match key_event.code {
            KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right | KeyCode::Char('t') => {
                view_state.toggle_on = !view_state.toggle_on;
                None
            }
            KeyCode::Enter => Some(UserCommand::SubmitAnswer {
                question_id: question.id,
                value: AnswerValue::Flag(view_state.toggle_on),
                ai_generated: false,
            }),
            KeyCode::Char('q') => {
                view_state.confirm_quit = true;
                None
            }
            _ => None,
        },
    }
}

/// Free-text editing. Every printable character goes into the buffer, so
/// quitting from here is Ctrl+C (handled above) or Esc-then-back.
fn handle_text_input(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let question_id = view_state.step;
    match key_event.code {
        KeyCode::Enter => Some(UserCommand::SubmitAnswer {
            question_id,
            value: AnswerValue::Text(view_state.text_input.clone()),
            ai_generated: view_state.draft_from_suggestion,
        }),
        KeyCode::Tab => Some(UserCommand::RequestSuggestions {
            question_id,
            draft: view_state.text_input.clone(),
        }),
        KeyCode::Backspace => {
            view_state.text_input.pop();
            view_state.draft_from_suggestion = false;
            None
        }
        KeyCode::Char(c) => {
            view_state.text_input.push(c);
            view_state.draft_from_suggestion = false;
            None
        }
        _ => None,
    }
}

fn handle_review(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Enter => Some(UserCommand::ConfirmReview),
        KeyCode::Esc | KeyCode::Backspace => Some(UserCommand::Back),
        KeyCode::Char('s') => Some(UserCommand::StartOver),
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn handle_report(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('e') => Some(UserCommand::ExportReport),
        KeyCode::Esc | KeyCode::Backspace => Some(UserCommand::Back),
        KeyCode::Char('s') => Some(UserCommand::StartOver),
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.report_scroll = view_state.report_scroll.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_state.report_scroll = view_state.report_scroll.saturating_add(1);
            None
        }
        KeyCode::PageUp => {
            view_state.report_scroll = view_state.report_scroll.saturating_sub(10);
            None
        }
        KeyCode::PageDown => {
            view_state.report_scroll = view_state.report_scroll.saturating_add(10);
            None
        }
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
