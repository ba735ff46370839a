// Advisor personas. The chosen persona colors every prompt sent to the
// model and the tone of the final report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three selectable advisor personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorId {
    Supporter,
    Strategist,
    Challenger,
}

impl AdvisorId {
    /// All personas in display order.
    pub const ALL: [AdvisorId; 3] = [
        AdvisorId::Supporter,
        AdvisorId::Strategist,
        AdvisorId::Challenger,
    ];

    /// Parse the persisted string form ("supporter", "strategist",
    /// "challenger").
    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "supporter" => Some(AdvisorId::Supporter),
            "strategist" => Some(AdvisorId::Strategist),
            "challenger" => Some(AdvisorId::Challenger),
            _ => None,
        }
    }

    /// Stable key used for persistence.
    pub fn key(&self) -> &'static str {
        match self {
            AdvisorId::Supporter => "supporter",
            AdvisorId::Strategist => "strategist",
            AdvisorId::Challenger => "challenger",
        }
    }

    /// Display name shown in the picker and report header.
    pub fn name(&self) -> &'static str {
        match self {
            AdvisorId::Supporter => "The Supporter",
            AdvisorId::Strategist => "The Strategist",
            AdvisorId::Challenger => "The Challenger",
        }
    }

    /// Short epithet shown next to the name in the picker.
    pub fn tagline(&self) -> &'static str {
        match self {
            AdvisorId::Supporter => "A warm, encouraging voice",
            AdvisorId::Strategist => "A balanced, logical guide",
            AdvisorId::Challenger => "A direct, analytical thinker",
        }
    }

    /// One-line description shown under the name in the picker.
    pub fn description(&self) -> &'static str {
        match self {
            AdvisorId::Supporter => "Encouraging and warm. Builds on what is working.",
            AdvisorId::Strategist => "Structured and analytical. Focuses on the plan.",
            AdvisorId::Challenger => "Direct and skeptical. Stress-tests every assumption.",
        }
    }

    /// Tone instruction injected into the system prompt.
    pub fn tone(&self) -> &'static str {
        match self {
            AdvisorId::Supporter => {
                "You are warm, encouraging, and optimistic. Highlight strengths first, \
                 frame concerns as opportunities, and keep the founder motivated."
            }
            AdvisorId::Strategist => {
                "You are analytical and structured. Reason about market, execution, and \
                 sequencing. Prefer concrete frameworks and measurable next steps."
            }
            AdvisorId::Challenger => {
                "You are direct and skeptical. Question every assumption, name the \
                 weakest part of the idea plainly, and push for evidence."
            }
        }
    }
}

impl fmt::Display for AdvisorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
