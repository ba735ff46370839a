// Prompt templates for phrasing suggestions and the validation report.
//
// Every prompt instructs the model to answer with a single JSON object so
// the response can be parsed without scraping prose.

use crate::wizard::advisor::AdvisorId;
use crate::wizard::question::Question;

// ---------------------------------------------------------------------------
// System prompt
// ---------------------------------------------------------------------------

/// Build the system prompt for all wizard LLM calls. The advisor's tone
/// instruction is the only per-session variation.
pub fn system_prompt(advisor: AdvisorId) -> String {
    format!(
        "You are {}, an advisor helping a founder think through a product idea.\n\
         {}\n\
         \n\
         Always respond with a single JSON object and nothing else. No prose \
         outside the JSON, no markdown fences.",
        advisor.name(),
        advisor.tone(),
    )
}

// ---------------------------------------------------------------------------
// Suggestion prompt
// ---------------------------------------------------------------------------

/// Build the prompt asking for phrasing suggestions on a free-text question.
///
/// The user's draft may be empty; the model then suggests from the question
/// alone. Earlier answers are included so suggestions stay consistent with
/// what the founder already said.
pub fn build_suggestion_prompt(
    question: &Question,
    draft: &str,
    prior_answers: &[(&str, String)],
) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(&format!(
        "## QUESTION\n{}\nGuidance: {}\n\n",
        question.text, question.guidance,
    ));

    if !prior_answers.is_empty() {
        prompt.push_str("## ANSWERS SO FAR\n");
        for (q, a) in prior_answers {
            prompt.push_str(&format!("{q}: {a}\n"));
        }
        prompt.push('\n');
    }

    if draft.is_empty() {
        prompt.push_str("## DRAFT\n(none yet)\n\n");
    } else {
        prompt.push_str(&format!("## DRAFT\n{draft}\n\n"));
    }

    prompt.push_str(
        "## TASK\nSuggest up to 3 concise ways to answer this question, each one \
         or two sentences. Improve on the draft where one exists.\n\
         Respond with JSON: {\"options\": [\"...\", \"...\"]}",
    );

    prompt
}

// ---------------------------------------------------------------------------
// Report prompt
// ---------------------------------------------------------------------------

/// Build the prompt for the final validation report over the completed
/// questionnaire.
pub fn build_report_prompt(advisor: AdvisorId, answers: &[(&str, String)]) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("## QUESTIONNAIRE\n");
    for (q, a) in answers {
        prompt.push_str(&format!("Q: {q}\nA: {a}\n\n"));
    }

    prompt.push_str(&format!(
        "## TASK\nAs {}, assess this idea based only on the answers above.\n\
         Respond with JSON:\n\
         {{\n\
           \"summary\": \"one-paragraph assessment of the idea\",\n\
           \"strengths\": [\"2-4 specific strengths\"],\n\
           \"concerns\": [\"2-4 specific concerns or risks\"],\n\
           \"insights\": \"the single most important observation\",\n\
           \"nextSteps\": [\"3-5 concrete, ordered next actions\"]\n\
         }}",
        advisor.name(),
    ));

    prompt
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::question::QUESTIONS;

    #[test]
    fn system_prompt_carries_persona_and_json_contract() {
        for advisor in AdvisorId::ALL {
            let sp = system_prompt(advisor);
            assert!(sp.contains(advisor.name()), "should name the persona");
            assert!(sp.contains(advisor.tone()), "should carry the tone");
            assert!(sp.contains("JSON object"), "should demand JSON output");
        }
    }

    #[test]
    fn suggestion_prompt_contains_sections() {
        let question = &QUESTIONS[0];
        let prior = vec![];
        let prompt = build_suggestion_prompt(question, "a meal planner app", &prior);

        assert!(prompt.contains("## QUESTION"), "should have QUESTION section");
        assert!(prompt.contains(question.text), "should contain the question");
        assert!(prompt.contains(question.guidance), "should contain guidance");
        assert!(prompt.contains("## DRAFT"), "should have DRAFT section");
        assert!(prompt.contains("a meal planner app"), "should contain the draft");
        assert!(prompt.contains("\"options\""), "should state the JSON shape");
        assert!(!prompt.contains("## ANSWERS SO FAR"), "no prior answers given");
    }

    #[test]
    fn suggestion_prompt_includes_prior_answers() {
        let question = &QUESTIONS[1];
        let prior = vec![("What is your idea?", "A meal-prep planner".to_string())];
        let prompt = build_suggestion_prompt(question, "", &prior);

        assert!(prompt.contains("## ANSWERS SO FAR"), "should list prior answers");
        assert!(prompt.contains("A meal-prep planner"), "should contain the answer");
        assert!(prompt.contains("(none yet)"), "empty draft should be marked");
    }

    #[test]
    fn report_prompt_contains_all_answers_and_shape() {
        let answers = vec![
            ("What is your idea?", "A meal-prep planner".to_string()),
            ("Who is it for?", "Busy parents".to_string()),
        ];
        let prompt = build_report_prompt(AdvisorId::Challenger, &answers);

        assert!(prompt.contains("## QUESTIONNAIRE"), "should have questionnaire section");
        assert!(prompt.contains("Busy parents"), "should contain every answer");
        assert!(prompt.contains("The Challenger"), "should name the persona");
        assert!(prompt.contains("\"summary\""), "should state the report shape");
        assert!(prompt.contains("\"nextSteps\""), "should use the camelCase key");
    }
}
