// The fixed question catalog and answer values.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input kinds
// ---------------------------------------------------------------------------

/// How a question is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// Free text with AI phrasing suggestions available.
    Text,
    /// Exactly one of the listed options.
    SingleChoice { options: Vec<&'static str> },
    /// Zero or more of the listed options.
    MultiSelect { options: Vec<&'static str> },
    /// An integer on an inclusive scale.
    Slider { min: u8, max: u8, label: &'static str },
    /// A yes/no switch with custom labels.
    Toggle { on: &'static str, off: &'static str },
}

impl InputKind {
    /// Free-text questions are the only ones that get AI suggestions.
    pub fn supports_suggestions(&self) -> bool {
        matches!(self, InputKind::Text)
    }
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// A submitted answer. The variant must match the question's input kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Choice(String),
    Multi(Vec<String>),
    Scale(u8),
    Flag(bool),
}

impl AnswerValue {
    /// Whether this answer is acceptable for a question of the given kind.
    pub fn fits(&self, kind: &InputKind) -> bool {
        match (self, kind) {
            (AnswerValue::Text(_), InputKind::Text) => true,
            (AnswerValue::Choice(c), InputKind::SingleChoice { options }) => {
                options.iter().any(|o| o == c)
            }
            (AnswerValue::Multi(picked), InputKind::MultiSelect { options }) => {
                picked.iter().all(|p| options.iter().any(|o| o == p))
            }
            (AnswerValue::Scale(v), InputKind::Slider { min, max, .. }) => {
                v >= min && v <= max
            }
            (AnswerValue::Flag(_), InputKind::Toggle { .. }) => true,
            _ => false,
        }
    }

    /// Render the answer as prose for the review screen and LLM prompts.
    pub fn display(&self, kind: &InputKind) -> String {
        match (self, kind) {
            (AnswerValue::Multi(picked), _) if picked.is_empty() => "None".to_string(),
            (AnswerValue::Multi(picked), _) => picked.join(", "),
            (AnswerValue::Scale(v), InputKind::Slider { max, label, .. }) => {
                format!("{v}/{max} ({label})")
            }
            (AnswerValue::Flag(b), InputKind::Toggle { on, off }) => {
                if *b { (*on).to_string() } else { (*off).to_string() }
            }
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Text(s) | AnswerValue::Choice(s) => write!(f, "{s}"),
            AnswerValue::Multi(picked) => write!(f, "{}", picked.join(", ")),
            AnswerValue::Scale(v) => write!(f, "{v}"),
            AnswerValue::Flag(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A single questionnaire step.
#[derive(Debug, Clone)]
pub struct Question {
    /// Stable 1-based id, also the step number.
    pub id: u32,
    /// The question shown as the panel title.
    pub text: &'static str,
    /// Hint shown under the input, also fed to the suggestion prompt.
    pub guidance: &'static str,
    pub kind: InputKind,
}

/// The fixed question sequence. Order is the wizard order; ids are 1-based
/// and contiguous.
pub static QUESTIONS: Lazy<Vec<Question>> = Lazy::new(|| {
    vec![
        Question {
            id: 1,
            text: "What is your idea?",
            guidance: "Describe the product or service in one or two sentences.",
            kind: InputKind::Text,
        },
        Question {
            id: 2,
            text: "Who is it for?",
            guidance: "Name the specific audience or customer you have in mind.",
            kind: InputKind::Text,
        },
        Question {
            id: 3,
            text: "What problem does it solve?",
            guidance: "What pain or friction goes away when your idea exists?",
            kind: InputKind::Text,
        },
        Question {
            id: 4,
            text: "What makes it different?",
            guidance: "How is this better than what people already use today?",
            kind: InputKind::Text,
        },
        Question {
            id: 5,
            text: "What is your main motivation?",
            guidance: "Pick the one that drives you most.",
            kind: InputKind::SingleChoice {
                options: vec![
                    "Build a business",
                    "Solve my own problem",
                    "Learn something new",
                    "Help a community",
                ],
            },
        },
        Question {
            id: 6,
            text: "What are your biggest challenges?",
            guidance: "Select everything that worries you right now.",
            kind: InputKind::MultiSelect {
                options: vec![
                    "Finding customers",
                    "Funding",
                    "Technical execution",
                    "Competition",
                    "Time",
                ],
            },
        },
        Question {
            id: 7,
            text: "How confident are you in this idea?",
            guidance: "Gut feeling is fine.",
            kind: InputKind::Slider {
                min: 1,
                max: 10,
                label: "confidence",
            },
        },
        Question {
            id: 8,
            text: "Have you talked to potential users?",
            guidance: "Any real conversation counts, even an informal one.",
            kind: InputKind::Toggle {
                on: "Yes, I have user feedback",
                off: "Not yet",
            },
        },
    ]
});

/// Look up a question by id.
pub fn question(id: u32) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

/// Number of steps in the wizard.
pub fn total_steps() -> u32 {
    QUESTIONS.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_contiguous_and_one_based() {
        for (idx, q) in QUESTIONS.iter().enumerate() {
            assert_eq!(q.id, idx as u32 + 1, "id out of order at index {idx}");
        }
    }

    #[test]
    fn catalog_covers_every_input_kind() {
        assert!(QUESTIONS.iter().any(|q| matches!(q.kind, InputKind::Text)));
        assert!(QUESTIONS
            .iter()
            .any(|q| matches!(q.kind, InputKind::SingleChoice { .. })));
        assert!(QUESTIONS
            .iter()
            .any(|q| matches!(q.kind, InputKind::MultiSelect { .. })));
        assert!(QUESTIONS
            .iter()
            .any(|q| matches!(q.kind, InputKind::Slider { .. })));
        assert!(QUESTIONS
            .iter()
            .any(|q| matches!(q.kind, InputKind::Toggle { .. })));
    }

    #[test]
    fn only_text_questions_support_suggestions() {
        for q in QUESTIONS.iter() {
            let is_text = matches!(q.kind, InputKind::Text);
            assert_eq!(q.kind.supports_suggestions(), is_text, "question {}", q.id);
        }
    }

    #[test]
    fn lookup_by_id() {
        assert!(question(1).is_some());
        assert!(question(total_steps()).is_some());
        assert!(question(0).is_none());
        assert!(question(total_steps() + 1).is_none());
    }

    #[test]
    fn text_fits_text_kind() {
        let v = AnswerValue::Text("a meal-prep service".to_string());
        assert!(v.fits(&InputKind::Text));
        assert!(!v.fits(&InputKind::Toggle { on: "y", off: "n" }));
    }

    #[test]
    fn choice_must_be_listed() {
        let kind = InputKind::SingleChoice {
            options: vec!["A", "B"],
        };
        assert!(AnswerValue::Choice("A".to_string()).fits(&kind));
        assert!(!AnswerValue::Choice("C".to_string()).fits(&kind));
    }

    #[test]
    fn multi_select_rejects_unlisted_options() {
        let kind = InputKind::MultiSelect {
            options: vec!["A", "B", "C"],
        };
        assert!(AnswerValue::Multi(vec!["A".to_string(), "C".to_string()]).fits(&kind));
        assert!(AnswerValue::Multi(vec![]).fits(&kind));
        assert!(!AnswerValue::Multi(vec!["A".to_string(), "X".to_string()]).fits(&kind));
    }

    #[test]
    fn scale_respects_bounds() {
        let kind = InputKind::Slider {
            min: 1,
            max: 10,
            label: "confidence",
        };
        assert!(AnswerValue::Scale(1).fits(&kind));
        assert!(AnswerValue::Scale(10).fits(&kind));
        assert!(!AnswerValue::Scale(0).fits(&kind));
        assert!(!AnswerValue::Scale(11).fits(&kind));
    }

    #[test]
    fn display_renders_each_kind() {
        let toggle = InputKind::Toggle {
            on: "Yes, I have user feedback",
            off: "Not yet",
        };
        assert_eq!(
            AnswerValue::Flag(true).display(&toggle),
            "Yes, I have user feedback"
        );
        assert_eq!(AnswerValue::Flag(false).display(&toggle), "Not yet");

        let slider = InputKind::Slider {
            min: 1,
            max: 10,
            label: "confidence",
        };
        assert_eq!(AnswerValue::Scale(7).display(&slider), "7/10 (confidence)");

        let multi = InputKind::MultiSelect {
            options: vec!["Funding", "Time"],
        };
        assert_eq!(
            AnswerValue::Multi(vec!["Funding".to_string(), "Time".to_string()]).display(&multi),
            "Funding, Time"
        );
        assert_eq!(AnswerValue::Multi(vec![]).display(&multi), "None");
    }

    #[test]
    fn answer_value_serde_roundtrip() {
        let values = [
            AnswerValue::Text("an idea".to_string()),
            AnswerValue::Choice("Funding".to_string()),
            AnswerValue::Multi(vec!["A".to_string()]),
            AnswerValue::Scale(5),
            AnswerValue::Flag(true),
        ];
        for v in values {
            let json = serde_json::to_string(&v).unwrap();
            let back: AnswerValue = serde_json::from_str(&json).unwrap();
            assert_eq!(back, v, "serde roundtrip failed for {json}");
        }
    }
}
