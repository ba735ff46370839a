// Wizard step state machine: advisor selection, answer collection,
// navigation, and the persisted session form.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::advisor::AdvisorId;
use super::question::{question, total_steps, AnswerValue, Question};

#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("no advisor selected")]
    NoAdvisor,

    #[error("answer submitted for question {got} but step {expected} is active")]
    OutOfStep { expected: u32, got: u32 },

    #[error("unknown question id {0}")]
    UnknownQuestion(u32),

    #[error("answer does not match the question's input kind")]
    ValueMismatch,
}

/// A stored answer plus whether it was taken from an AI suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub value: AnswerValue,
    pub ai_generated: bool,
}

/// The wizard's progress through the questionnaire.
///
/// `current` is the 1-based id of the active question; a value past the
/// catalog end means every question has been answered.
#[derive(Debug, Clone)]
pub struct WizardState {
    advisor: Option<AdvisorId>,
    answers: HashMap<u32, Answer>,
    current: u32,
}

impl WizardState {
    pub fn new() -> Self {
        WizardState {
            advisor: None,
            answers: HashMap::new(),
            current: 1,
        }
    }

    pub fn advisor(&self) -> Option<AdvisorId> {
        self.advisor
    }

    /// Pick the advisor persona. Keeps any answers already given so a
    /// persona change mid-session does not lose progress.
    pub fn select_advisor(&mut self, advisor: AdvisorId) {
        self.advisor = Some(advisor);
    }

    /// Id of the active question (1-based). Equals `total_steps() + 1` when
    /// the questionnaire is complete.
    pub fn current_step(&self) -> u32 {
        self.current
    }

    /// The active question, or None when all questions are answered.
    pub fn current_question(&self) -> Option<&'static Question> {
        question(self.current)
    }

    /// Every question answered.
    pub fn is_complete(&self) -> bool {
        (1..=total_steps()).all(|id| self.answers.contains_key(&id))
    }

    pub fn answer(&self, question_id: u32) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    /// Submit the answer for the active question and advance one step.
    ///
    /// The submission must target the active question and the value must fit
    /// its input kind; re-answering after navigating back overwrites the
    /// stored answer.
    pub fn submit(
        &mut self,
        question_id: u32,
        value: AnswerValue,
        ai_generated: bool,
    ) -> Result<(), StateError> {
        if self.advisor.is_none() {
            return Err(StateError::NoAdvisor);
        }
        if question_id != self.current {
            return Err(StateError::OutOfStep {
                expected: self.current,
                got: question_id,
            });
        }
        let q = question(question_id).ok_or(StateError::UnknownQuestion(question_id))?;
        if !value.fits(&q.kind) {
            return Err(StateError::ValueMismatch);
        }

        self.answers.insert(question_id, Answer { value, ai_generated });
        self.current += 1;
        Ok(())
    }

    /// Step back to the previous question. Returns false at the first
    /// question, where backing out means returning to the advisor picker.
    pub fn back(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Return from the review screen to the last question.
    pub fn reopen_last(&mut self) {
        self.current = total_steps();
    }

    /// Discard everything and return to the initial state.
    pub fn reset(&mut self) {
        self.advisor = None;
        self.answers.clear();
        self.current = 1;
    }

    /// `(question_id, rendered answer, ai_generated)` in catalog order, for
    /// the review screen and report prompts. Unanswered questions are
    /// skipped.
    pub fn answers_display(&self) -> Vec<(u32, String, bool)> {
        let mut out = Vec::new();
        for id in 1..=total_steps() {
            if let (Some(q), Some(ans)) = (question(id), self.answers.get(&id)) {
                out.push((id, ans.value.display(&q.kind), ans.ai_generated));
            }
        }
        out
    }

    /// `(question text, rendered answer)` pairs for prompt assembly.
    pub fn qa_pairs(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        for id in 1..=total_steps() {
            if let (Some(q), Some(ans)) = (question(id), self.answers.get(&id)) {
                out.push((q.text, ans.value.display(&q.kind)));
            }
        }
        out
    }
}

impl Default for WizardState {
    fn default() -> Self {
        WizardState::new()
    }
}

// ---------------------------------------------------------------------------
// Persisted form
// ---------------------------------------------------------------------------

/// Serialized session snapshot written to the database after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub advisor: Option<AdvisorId>,
    pub answers: Vec<SavedAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAnswer {
    pub question_id: u32,
    pub value: AnswerValue,
    pub ai_generated: bool,
}

impl WizardState {
    pub fn to_saved(&self) -> SavedSession {
        let mut answers: Vec<SavedAnswer> = self
            .answers
            .iter()
            .map(|(id, a)| SavedAnswer {
                question_id: *id,
                value: a.value.clone(),
                ai_generated: a.ai_generated,
            })
            .collect();
        answers.sort_by_key(|a| a.question_id);
        SavedSession {
            advisor: self.advisor,
            answers,
        }
    }

    /// Rebuild the state from a saved session. Answers for unknown question
    /// ids are dropped; the active step becomes the first unanswered
    /// question.
    pub fn from_saved(saved: SavedSession) -> Self {
        let mut answers = HashMap::new();
        for a in saved.answers {
            if let Some(q) = question(a.question_id) {
                if a.value.fits(&q.kind) {
                    answers.insert(
                        a.question_id,
                        Answer {
                            value: a.value,
                            ai_generated: a.ai_generated,
                        },
                    );
                }
            }
        }
        let current = (1..=total_steps())
            .find(|id| !answers.contains_key(id))
            .unwrap_or(total_steps() + 1);
        WizardState {
            advisor: saved.advisor,
            answers,
            current,
        }
    }
}
