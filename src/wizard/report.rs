// The final validation report: model-output parsing, the fallback used
// when the model is unavailable, and Markdown export.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guard;

use super::advisor::AdvisorId;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("report is missing required content: {0}")]
    MissingContent(&'static str),
}

/// The structured report produced at the end of the wizard.
///
/// Field aliases accept the camelCase keys the model is prompted to emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(alias = "ideaSummary")]
    pub summary: String,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    #[serde(default)]
    pub insights: String,
    #[serde(rename = "next_steps", alias = "nextSteps")]
    pub next_steps: Vec<String>,
}

impl ValidationReport {
    /// Parse a model response body into a report.
    ///
    /// Every field is sanitized; empty items produced by sanitization are
    /// dropped. A report with no summary, no strengths, no concerns, or no
    /// next steps is rejected so the caller can fall back.
    pub fn from_llm_json(content: &str, max_chars: usize) -> Result<Self, ReportError> {
        let raw: ValidationReport = serde_json::from_str(content)?;

        let clean_list = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|s| guard::sanitize(&s, max_chars))
                .filter(|s| !s.is_empty())
                .collect()
        };

        let report = ValidationReport {
            summary: guard::sanitize(&raw.summary, max_chars),
            strengths: clean_list(raw.strengths),
            concerns: clean_list(raw.concerns),
            insights: guard::sanitize(&raw.insights, max_chars),
            next_steps: clean_list(raw.next_steps),
        };

        if report.summary.is_empty() {
            return Err(ReportError::MissingContent("summary"));
        }
        if report.strengths.is_empty() {
            return Err(ReportError::MissingContent("strengths"));
        }
        if report.concerns.is_empty() {
            return Err(ReportError::MissingContent("concerns"));
        }
        if report.next_steps.is_empty() {
            return Err(ReportError::MissingContent("next steps"));
        }
        Ok(report)
    }

    /// Generic report substituted when the model is disabled or every
    /// attempt failed. Deliberately advisor-neutral beyond the framing line.
    pub fn fallback(advisor: AdvisorId) -> Self {
        ValidationReport {
            summary: format!(
                "{} could not reach the analysis service, so this is a generic \
                 checklist rather than a tailored assessment.",
                advisor.name()
            ),
            strengths: vec![
                "You have articulated the idea, its audience, and the problem it solves."
                    .to_string(),
                "Working through a structured questionnaire is itself early validation work."
                    .to_string(),
            ],
            concerns: vec![
                "The idea has not been assessed against market or execution risks yet."
                    .to_string(),
                "Assumptions about the audience remain untested.".to_string(),
            ],
            insights: "Retry once the service is reachable to get an assessment grounded \
                       in your specific answers."
                .to_string(),
            next_steps: vec![
                "Talk to three potential users about the problem this week.".to_string(),
                "Write down the single riskiest assumption and how you would test it."
                    .to_string(),
                "Sketch the smallest version of the idea you could put in front of someone."
                    .to_string(),
            ],
        }
    }

    /// Render the report as a Markdown document.
    pub fn to_markdown(&self, advisor: AdvisorId, answers: &[(&str, String)]) -> String {
        let mut out = String::new();
        out.push_str("# Idea Validation Report\n\n");
        out.push_str(&format!("Advisor: {}\n", advisor.name()));
        out.push_str(&format!("Date: {}\n\n", Local::now().format("%Y-%m-%d %H:%M")));

        out.push_str("## Summary\n\n");
        out.push_str(&self.summary);
        out.push_str("\n\n## Strengths\n\n");
        for item in &self.strengths {
            out.push_str(&format!("- {item}\n"));
        }
        out.push_str("\n## Concerns\n\n");
        for item in &self.concerns {
            out.push_str(&format!("- {item}\n"));
        }
        if !self.insights.is_empty() {
            out.push_str("\n## Insights\n\n");
            out.push_str(&self.insights);
            out.push('\n');
        }
        out.push_str("\n## Next Steps\n\n");
        for (i, item) in self.next_steps.iter().enumerate() {
            out.push_str(&format!("{}. {item}\n", i + 1));
        }

        if !answers.is_empty() {
            out.push_str("\n## Your Answers\n\n");
            for (q, a) in answers {
                out.push_str(&format!("**{q}**\n{a}\n\n"));
            }
        }
        out
    }

    /// Write the Markdown rendering to a timestamped file in the working
    /// directory. Returns the path written.
    pub fn export(
        &self,
        advisor: AdvisorId,
        answers: &[(&str, String)],
    ) -> std::io::Result<PathBuf> {
        let filename = format!(
            "ideaforge-report-{}.md",
            Local::now().format("%Y%m%d-%H%M%S")
        );
        let path = PathBuf::from(filename);
        fs::write(&path, self.to_markdown(advisor, answers))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 2000;

    fn valid_json() -> &'static str {
        r#"{
            "summary": "A focused idea with a clear audience.",
            "strengths": ["Clear problem statement", "Specific audience"],
            "concerns": ["Crowded market"],
            "insights": "The differentiator needs sharpening.",
            "nextSteps": ["Interview five target users", "Map three competitors"]
        }"#
    }

    #[test]
    fn parses_camel_case_keys() {
        let report = ValidationReport::from_llm_json(valid_json(), MAX).unwrap();
        assert_eq!(report.summary, "A focused idea with a clear audience.");
        assert_eq!(report.strengths.len(), 2);
        assert_eq!(report.next_steps.len(), 2);
    }

    #[test]
    fn parses_idea_summary_alias() {
        let json = r#"{
            "ideaSummary": "Alias form.",
            "strengths": ["s"],
            "concerns": ["c"],
            "nextSteps": ["n"]
        }"#;
        let report = ValidationReport::from_llm_json(json, MAX).unwrap();
        assert_eq!(report.summary, "Alias form.");
        assert_eq!(report.insights, "");
    }

    #[test]
    fn rejects_non_json() {
        let err = ValidationReport::from_llm_json("not json at all", MAX);
        assert!(matches!(err, Err(ReportError::Json(_))));
    }

    #[test]
    fn rejects_empty_summary() {
        let json = r#"{
            "summary": "",
            "strengths": ["s"],
            "concerns": ["c"],
            "nextSteps": ["n"]
        }"#;
        let err = ValidationReport::from_llm_json(json, MAX);
        assert!(matches!(err, Err(ReportError::MissingContent("summary"))));
    }

    #[test]
    fn rejects_empty_lists() {
        let json = r#"{
            "summary": "s",
            "strengths": [],
            "concerns": ["c"],
            "nextSteps": ["n"]
        }"#;
        assert!(ValidationReport::from_llm_json(json, MAX).is_err());
    }

    #[test]
    fn sanitizes_injected_markup() {
        let json = r#"{
            "summary": "Good idea <script>alert(1)</script> overall",
            "strengths": ["<b>bold</b> claim", "<script>x</script>"],
            "concerns": ["fine"],
            "nextSteps": ["ship it"]
        }"#;
        let report = ValidationReport::from_llm_json(json, MAX).unwrap();
        assert_eq!(report.summary, "Good idea  overall");
        // The all-markup strength sanitizes to empty and is dropped.
        assert_eq!(report.strengths, vec!["bold claim".to_string()]);
    }

    #[test]
    fn list_that_sanitizes_to_empty_is_rejected() {
        let json = r#"{
            "summary": "s",
            "strengths": ["<script>only</script>"],
            "concerns": ["c"],
            "nextSteps": ["n"]
        }"#;
        assert!(ValidationReport::from_llm_json(json, MAX).is_err());
    }

    #[test]
    fn fallback_is_complete() {
        for advisor in AdvisorId::ALL {
            let report = ValidationReport::fallback(advisor);
            assert!(!report.summary.is_empty());
            assert!(!report.strengths.is_empty());
            assert!(!report.concerns.is_empty());
            assert!(!report.next_steps.is_empty());
            assert!(report.summary.contains(advisor.name()));
        }
    }

    #[test]
    fn markdown_contains_all_sections() {
        let report = ValidationReport::from_llm_json(valid_json(), MAX).unwrap();
        let answers = vec![("What is your idea?", "A meal-prep planner".to_string())];
        let md = report.to_markdown(AdvisorId::Strategist, &answers);
        assert!(md.contains("# Idea Validation Report"));
        assert!(md.contains("Advisor: The Strategist"));
        assert!(md.contains("## Summary"));
        assert!(md.contains("## Strengths"));
        assert!(md.contains("## Concerns"));
        assert!(md.contains("## Insights"));
        assert!(md.contains("## Next Steps"));
        assert!(md.contains("1. Interview five target users"));
        assert!(md.contains("**What is your idea?**"));
    }

    #[test]
    fn markdown_omits_empty_insights() {
        let mut report = ValidationReport::from_llm_json(valid_json(), MAX).unwrap();
        report.insights.clear();
        let md = report.to_markdown(AdvisorId::Supporter, &[]);
        assert!(!md.contains("## Insights"));
        assert!(!md.contains("## Your Answers"));
    }

    #[test]
    fn report_serde_roundtrip() {
        let report = ValidationReport::from_llm_json(valid_json(), MAX).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
