// Shared message types exchanged between the app orchestrator, spawned LLM
// tasks, and the TUI render loop.

use crate::wizard::advisor::AdvisorId;
use crate::wizard::question::AnswerValue;
use crate::wizard::report::ValidationReport;

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

/// Which screen of the wizard is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Advisor persona picker.
    Welcome,
    /// One of the questionnaire steps.
    Question,
    /// All answers listed for confirmation.
    Review,
    /// The generated validation report.
    Report,
}

// ---------------------------------------------------------------------------
// LLM status
// ---------------------------------------------------------------------------

/// Status of an outstanding LLM request as shown in the UI.
///
/// There is deliberately no error state: a failed request resolves to
/// `Fallback` and the UI shows the substituted generic content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmStatus {
    Idle,
    Pending,
    Complete,
    /// The request failed and hard-coded fallback content was substituted.
    Fallback,
}

// ---------------------------------------------------------------------------
// User commands (TUI -> orchestrator)
// ---------------------------------------------------------------------------

/// Commands sent from the TUI input handler to the app orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Pick an advisor persona on the welcome screen.
    SelectAdvisor(AdvisorId),
    /// Submit the answer for a question and advance.
    SubmitAnswer {
        question_id: u32,
        value: AnswerValue,
        ai_generated: bool,
    },
    /// Go back one step (to the previous question or the welcome screen).
    Back,
    /// Request AI phrasing suggestions for a free-text question.
    RequestSuggestions { question_id: u32, draft: String },
    /// Confirm the review screen and generate the validation report.
    ConfirmReview,
    /// Write the current report to a Markdown file.
    ExportReport,
    /// Discard the session and return to the welcome screen.
    StartOver,
    /// Exit the application.
    Quit,
}

// ---------------------------------------------------------------------------
// LLM events (spawned task -> orchestrator)
// ---------------------------------------------------------------------------

/// Events emitted by spawned LLM tasks.
///
/// The `generation` counter is threaded through every event so the
/// orchestrator can discard results from superseded tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmEvent {
    /// Parsed suggestion options for a question.
    Suggestions {
        question_id: u32,
        options: Vec<String>,
        generation: u64,
    },
    /// Parsed and validated report.
    Report {
        report: Box<ValidationReport>,
        generation: u64,
    },
    /// The request failed; the orchestrator substitutes the fallback.
    Failed { message: String, generation: u64 },
}

// ---------------------------------------------------------------------------
// UI updates (orchestrator -> TUI)
// ---------------------------------------------------------------------------

/// Snapshot of the wizard state for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSnapshot {
    pub screen: Screen,
    pub advisor: Option<AdvisorId>,
    /// Current question id when on the question screen (1-based).
    pub step: u32,
    pub total_steps: u32,
    /// `(question_id, display string, ai_generated)` for the review screen.
    pub answers: Vec<(u32, String, bool)>,
    /// Previously submitted answer for the current question, if any, so the
    /// TUI can pre-fill the input when the user navigates back.
    pub current_answer: Option<AnswerValue>,
}

/// Incremental updates pushed from the orchestrator to the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Snapshot(Box<AppSnapshot>),
    /// Suggestion options for the named question. `fallback` marks the
    /// hard-coded generic set substituted after a failure.
    Suggestions {
        question_id: u32,
        options: Vec<String>,
        fallback: bool,
    },
    SuggestionStatus(LlmStatus),
    ReportStatus(LlmStatus),
    Report(Box<ValidationReport>),
    /// Path the report was exported to.
    ReportExported(String),
    /// Transient one-line notice shown in the status bar.
    Notice(String),
}
