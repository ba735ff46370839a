// Application state and orchestration logic.
//
// The central event loop that coordinates user commands from the TUI and
// results from spawned LLM tasks. Owns the wizard state, persists it after
// every mutation, and pushes UI updates to the TUI render loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::guard::{self, GuardError, RateLimiter};
use crate::llm::client::{fallback_suggestions, LlmClient};
use crate::llm::prompt;
use crate::protocol::{AppSnapshot, LlmEvent, LlmStatus, Screen, UiUpdate, UserCommand};
use crate::session::SessionStore;
use crate::wizard::advisor::AdvisorId;
use crate::wizard::question::{self, AnswerValue};
use crate::wizard::report::ValidationReport;
use crate::wizard::state::WizardState;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// What the LLM is currently working on.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmMode {
    /// Phrasing suggestions for a free-text question.
    Suggestions { question_id: u32 },
    /// The final validation report.
    Report,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub wizard: WizardState,
    pub screen: Screen,
    pub store: SessionStore,
    pub report: Option<ValidationReport>,
    /// Sliding-window limiter over all outbound LLM requests. A rejected
    /// request resolves to the fallback path instead of going out.
    pub rate_limiter: RateLimiter,
    pub llm_client: Arc<LlmClient>,
    /// Sender for LLM events; spawned tasks use a clone of this sender to
    /// report their outcome back to the main event loop.
    pub llm_tx: mpsc::Sender<LlmEvent>,
    /// Monotonically increasing counter identifying the current LLM task.
    /// Events from stale generations are discarded in `handle_llm_event`.
    pub llm_generation: u64,
    pub llm_mode: Option<LlmMode>,
    pub current_llm_task: Option<tokio::task::JoinHandle<()>>,
}

impl AppState {
    /// Create a new AppState, restoring any saved session from the store.
    pub fn new(
        config: Config,
        store: SessionStore,
        llm_client: LlmClient,
        llm_tx: mpsc::Sender<LlmEvent>,
    ) -> Self {
        let wizard = match store.load_session(config.session.max_age_hours) {
            Ok(Some(saved)) => {
                info!("restored saved session");
                WizardState::from_saved(saved)
            }
            Ok(None) => WizardState::new(),
            Err(e) => {
                warn!(error = %e, "failed to load saved session, starting fresh");
                WizardState::new()
            }
        };

        // A completed session gets its most recent report back from the
        // history, provided it was written by the same advisor.
        let report = if wizard.is_complete() {
            restore_report(&store, wizard.advisor())
        } else {
            None
        };

        let screen = if wizard.advisor().is_none() {
            Screen::Welcome
        } else if report.is_some() {
            Screen::Report
        } else if wizard.is_complete() {
            Screen::Review
        } else {
            Screen::Question
        };

        let rate_limiter = RateLimiter::new(
            config.limits.max_requests_per_minute,
            Duration::from_secs(config.limits.rate_window_secs),
        );

        AppState {
            config,
            wizard,
            screen,
            store,
            report,
            rate_limiter,
            llm_client: Arc::new(llm_client),
            llm_tx,
            llm_generation: 0,
            llm_mode: None,
            current_llm_task: None,
        }
    }

    /// Build an `AppSnapshot` from the current state for the TUI.
    pub fn build_snapshot(&self) -> AppSnapshot {
        let current_answer = self
            .wizard
            .answer(self.wizard.current_step())
            .map(|a| a.value.clone());

        AppSnapshot {
            screen: self.screen,
            advisor: self.wizard.advisor(),
            step: self.wizard.current_step(),
            total_steps: question::total_steps(),
            answers: self.wizard.answers_display(),
            current_answer,
        }
    }

    /// Write the wizard state to the session store.
    fn persist(&self) {
        if let Err(e) = self.store.save_session(&self.wizard.to_saved()) {
            warn!(error = %e, "failed to persist session");
        }
    }

    /// Cancel the current LLM task if one is running.
    pub fn cancel_llm_task(&mut self) {
        if let Some(handle) = self.current_llm_task.take() {
            handle.abort();
            info!("cancelled previous LLM task");
        }
        self.llm_mode = None;
    }

    /// Admit or reject an outbound LLM request. On rejection returns the
    /// time until the window frees up.
    fn admit_request(&mut self) -> Result<(), Duration> {
        if self.rate_limiter.try_acquire() {
            Ok(())
        } else {
            Err(self.rate_limiter.retry_after())
        }
    }

    /// Spawn a suggestion request for the given question, superseding any
    /// in-flight task. On error the caller substitutes the fallback set.
    fn trigger_suggestions(&mut self, question_id: u32, draft: &str) -> Result<(), String> {
        let Some(q) = question::question(question_id) else {
            return Err(format!("unknown question {question_id}"));
        };
        if !q.kind.supports_suggestions() {
            return Err("suggestions are only available for free-text questions".into());
        }

        // A partial draft may be arbitrarily short, so only the ceiling is
        // enforced here.
        let draft = guard::sanitize(draft, self.config.limits.max_input_chars);
        if !draft.is_empty() {
            if let Err(e) = guard::validate(&draft, 0, self.config.limits.max_input_chars) {
                return Err(e.to_string());
            }
        }

        if let Err(wait) = self.admit_request() {
            return Err(format!(
                "request limit reached, try again in {}s",
                wait.as_secs().max(1)
            ));
        }

        self.cancel_llm_task();
        self.llm_generation += 1;
        let generation = self.llm_generation;
        self.llm_mode = Some(LlmMode::Suggestions { question_id });

        // Advisor presence is guaranteed past the welcome screen; fall back
        // to the first persona rather than panic if it is somehow missing.
        let advisor = self
            .wizard
            .advisor()
            .unwrap_or(AdvisorId::ALL[0]);
        let system = prompt::system_prompt(advisor);
        let user_content = prompt::build_suggestion_prompt(q, &draft, &self.wizard.qa_pairs());

        let max_tokens = self.config.llm.suggestion_max_tokens;
        let max_chars = self.config.limits.max_input_chars;
        let client = Arc::clone(&self.llm_client);
        let tx = self.llm_tx.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = client
                .request_suggestions(
                    question_id,
                    &system,
                    &user_content,
                    max_tokens,
                    max_chars,
                    tx,
                    generation,
                )
                .await
            {
                warn!(error = %e, "suggestion task failed");
            }
        });
        self.current_llm_task = Some(handle);
        info!(question_id, generation, "triggered suggestion request");
        Ok(())
    }

    /// Spawn the report request over the completed questionnaire.
    fn trigger_report(&mut self) -> Result<(), String> {
        let Some(advisor) = self.wizard.advisor() else {
            return Err("no advisor selected".into());
        };
        if !self.wizard.is_complete() {
            return Err("answer every question before generating the report".into());
        }

        if let Err(wait) = self.admit_request() {
            return Err(format!(
                "request limit reached, try again in {}s",
                wait.as_secs().max(1)
            ));
        }

        self.cancel_llm_task();
        self.llm_generation += 1;
        let generation = self.llm_generation;
        self.llm_mode = Some(LlmMode::Report);

        let system = prompt::system_prompt(advisor);
        let user_content = prompt::build_report_prompt(advisor, &self.wizard.qa_pairs());

        let max_tokens = self.config.llm.report_max_tokens;
        let max_chars = self.config.limits.max_input_chars;
        let client = Arc::clone(&self.llm_client);
        let tx = self.llm_tx.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = client
                .request_report(&system, &user_content, max_tokens, max_chars, tx, generation)
                .await
            {
                warn!(error = %e, "report task failed");
            }
        });
        self.current_llm_task = Some(handle);
        info!(generation, "triggered report request");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens on two channels using `tokio::select!`: user commands from the
/// TUI and results from spawned LLM tasks. Pushes UI updates through
/// `ui_tx` for the TUI render loop.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut llm_rx: mpsc::Receiver<LlmEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("application event loop started");

    // Push the restored state so the TUI opens on the right screen.
    let _ = ui_tx
        .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
        .await;

    // Track whether the LLM channel is still open. When it closes we stop
    // polling it so tokio::select! never spins on a closed channel.
    let mut llm_open = true;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("command channel closed, shutting down");
                        break;
                    }
                }
            }

            llm_event = llm_rx.recv(), if llm_open => {
                match llm_event {
                    Some(event) => {
                        handle_llm_event(&mut state, event, &ui_tx).await;
                    }
                    None => {
                        info!("LLM channel closed");
                        llm_open = false;
                    }
                }
            }
        }
    }

    state.cancel_llm_task();
    info!("application event loop exiting");
    Ok(())
}

/// Handle a user command from the TUI.
pub async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::SelectAdvisor(advisor) => {
            info!(%advisor, "advisor selected");
            state.wizard.select_advisor(advisor);
            state.screen = if state.wizard.is_complete() {
                Screen::Review
            } else {
                Screen::Question
            };
            state.persist();
            send_snapshot(state, ui_tx).await;
        }

        UserCommand::SubmitAnswer {
            question_id,
            value,
            ai_generated,
        } => {
            let value = match clean_answer(state, value) {
                Ok(v) => v,
                Err(e) => {
                    let _ = ui_tx.send(UiUpdate::Notice(e.to_string())).await;
                    return;
                }
            };

            if let Err(e) = state.wizard.submit(question_id, value, ai_generated) {
                warn!(error = %e, question_id, "answer rejected");
                let _ = ui_tx.send(UiUpdate::Notice(e.to_string())).await;
                return;
            }

            // A submission supersedes any suggestion request for the
            // previous question.
            state.cancel_llm_task();

            if state.wizard.is_complete() {
                state.screen = Screen::Review;
            }
            state.persist();
            send_snapshot(state, ui_tx).await;
        }

        UserCommand::Back => {
            match state.screen {
                Screen::Report => {
                    state.screen = Screen::Review;
                }
                Screen::Review => {
                    state.wizard.reopen_last();
                    state.screen = Screen::Question;
                }
                Screen::Question => {
                    state.cancel_llm_task();
                    if !state.wizard.back() {
                        state.screen = Screen::Welcome;
                    }
                }
                Screen::Welcome => {}
            }
            send_snapshot(state, ui_tx).await;
        }

        UserCommand::RequestSuggestions { question_id, draft } => {
            let _ = ui_tx
                .send(UiUpdate::SuggestionStatus(LlmStatus::Pending))
                .await;
            if let Err(reason) = state.trigger_suggestions(question_id, &draft) {
                info!(question_id, %reason, "suggestion request fell back");
                let _ = ui_tx.send(UiUpdate::Notice(reason)).await;
                let _ = ui_tx
                    .send(UiUpdate::Suggestions {
                        question_id,
                        options: fallback_suggestions(),
                        fallback: true,
                    })
                    .await;
                let _ = ui_tx
                    .send(UiUpdate::SuggestionStatus(LlmStatus::Fallback))
                    .await;
            }
        }

        UserCommand::ConfirmReview => {
            let _ = ui_tx.send(UiUpdate::ReportStatus(LlmStatus::Pending)).await;
            if let Err(reason) = state.trigger_report() {
                info!(%reason, "report request fell back");
                let _ = ui_tx.send(UiUpdate::Notice(reason)).await;
                substitute_fallback_report(state, ui_tx).await;
            }
        }

        UserCommand::ExportReport => {
            let (Some(report), Some(advisor)) = (&state.report, state.wizard.advisor()) else {
                let _ = ui_tx
                    .send(UiUpdate::Notice("no report to export".into()))
                    .await;
                return;
            };
            match report.export(advisor, &state.wizard.qa_pairs()) {
                Ok(path) => {
                    info!(path = %path.display(), "report exported");
                    let _ = ui_tx
                        .send(UiUpdate::ReportExported(path.display().to_string()))
                        .await;
                }
                Err(e) => {
                    warn!(error = %e, "report export failed");
                    let _ = ui_tx
                        .send(UiUpdate::Notice(format!("export failed: {e}")))
                        .await;
                }
            }
        }

        UserCommand::StartOver => {
            info!("starting over, discarding session");
            state.cancel_llm_task();
            state.wizard.reset();
            state.report = None;
            state.screen = Screen::Welcome;
            if let Err(e) = state.store.clear_session() {
                warn!(error = %e, "failed to clear saved session");
            }
            send_snapshot(state, ui_tx).await;
        }

        UserCommand::Quit => {
            // Handled in the main loop.
        }
    }
}

/// Handle the outcome of a spawned LLM task.
///
/// Every event carries the generation counter set when its task was
/// spawned; events from superseded generations are discarded. A `Failed`
/// event substitutes the hard-coded fallback for whatever the task was
/// working on, so the UI never shows a dead end.
pub async fn handle_llm_event(
    state: &mut AppState,
    event: LlmEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let event_generation = match &event {
        LlmEvent::Suggestions { generation, .. } => *generation,
        LlmEvent::Report { generation, .. } => *generation,
        LlmEvent::Failed { generation, .. } => *generation,
    };
    if event_generation != state.llm_generation {
        debug!(
            event_generation,
            current = state.llm_generation,
            "discarding stale LLM event"
        );
        return;
    }

    match (state.llm_mode.clone(), event) {
        (Some(LlmMode::Suggestions { question_id }), LlmEvent::Suggestions { options, .. }) => {
            state.llm_mode = None;
            let _ = ui_tx
                .send(UiUpdate::Suggestions {
                    question_id,
                    options,
                    fallback: false,
                })
                .await;
            let _ = ui_tx
                .send(UiUpdate::SuggestionStatus(LlmStatus::Complete))
                .await;
        }

        (Some(LlmMode::Suggestions { question_id }), LlmEvent::Failed { message, .. }) => {
            warn!(%message, question_id, "suggestion request failed, using fallback");
            state.llm_mode = None;
            let _ = ui_tx
                .send(UiUpdate::Suggestions {
                    question_id,
                    options: fallback_suggestions(),
                    fallback: true,
                })
                .await;
            let _ = ui_tx
                .send(UiUpdate::SuggestionStatus(LlmStatus::Fallback))
                .await;
        }

        (Some(LlmMode::Report), LlmEvent::Report { report, .. }) => {
            state.llm_mode = None;
            if let Some(advisor) = state.wizard.advisor() {
                if let Err(e) = state.store.save_report(advisor.key(), &report) {
                    warn!(error = %e, "failed to persist report");
                }
            }
            state.report = Some(*report.clone());
            state.screen = Screen::Report;
            let _ = ui_tx.send(UiUpdate::Report(report)).await;
            let _ = ui_tx.send(UiUpdate::ReportStatus(LlmStatus::Complete)).await;
            send_snapshot(state, ui_tx).await;
        }

        (Some(LlmMode::Report), LlmEvent::Failed { message, .. }) => {
            warn!(%message, "report request failed, using fallback");
            state.llm_mode = None;
            substitute_fallback_report(state, ui_tx).await;
        }

        // Crossed wires after a mode change; the generation check catches
        // most of these, this catches the rest.
        (mode, event) => {
            debug!(?mode, ?event, "discarding LLM event with no matching mode");
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn send_snapshot(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let _ = ui_tx
        .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
        .await;
}

/// Sanitize and validate a submitted answer. Only free-text values carry
/// user-typed content; the other kinds come from fixed inputs.
fn clean_answer(state: &AppState, value: AnswerValue) -> Result<AnswerValue, GuardError> {
    match value {
        AnswerValue::Text(text) => {
            let clean = guard::sanitize(&text, state.config.limits.max_input_chars);
            guard::validate(
                &clean,
                state.config.limits.min_input_chars,
                state.config.limits.max_input_chars,
            )?;
            Ok(AnswerValue::Text(clean))
        }
        other => Ok(other),
    }
}

/// Pull the most recent stored report back out of the history, keeping it
/// only when its advisor key matches the restored session's advisor.
fn restore_report(store: &SessionStore, advisor: Option<AdvisorId>) -> Option<ValidationReport> {
    let advisor = advisor?;
    let stored = match store.recent_reports(1) {
        Ok(reports) => reports.into_iter().next()?,
        Err(e) => {
            warn!(error = %e, "failed to read report history");
            return None;
        }
    };
    if AdvisorId::from_key(&stored.advisor) != Some(advisor) {
        return None;
    }
    info!("restored report from history");
    Some(stored.report)
}

/// Show the generic fallback report and persist it like a real one.
async fn substitute_fallback_report(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let Some(advisor) = state.wizard.advisor() else {
        return;
    };
    let report = ValidationReport::fallback(advisor);
    if let Err(e) = state.store.save_report(advisor.key(), &report) {
        warn!(error = %e, "failed to persist fallback report");
    }
    state.report = Some(report.clone());
    state.screen = Screen::Report;
    let _ = ui_tx.send(UiUpdate::Report(Box::new(report))).await;
    let _ = ui_tx.send(UiUpdate::ReportStatus(LlmStatus::Fallback)).await;
    send_snapshot(state, ui_tx).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
