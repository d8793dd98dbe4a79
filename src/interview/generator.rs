//! Question set generator — asks the backend for a typed question set and
//! validates it, substituting a fixed set when the output is unusable.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ValidationError;
use crate::llm::CompletionClient;

use super::model::{
    MAX_QUESTIONS, MIN_CHOICE_OPTIONS, Profile, Question, QuestionKind, QuestionSet, Task,
};
use super::outcome::{FallbackReason, Outcome};
use super::prompts::question_generation_prompt;

/// Generates interview questions for a (task, profile) pair.
pub struct QuestionSetGenerator {
    client: Arc<dyn CompletionClient>,
}

impl QuestionSetGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Generate a question set with exactly one backend call.
    ///
    /// Never fails: backend errors and malformed payloads yield
    /// `Outcome::Fallback` carrying `fallback_question_set()`.
    pub async fn generate(&self, task: Task, profile: &Profile) -> Outcome<QuestionSet> {
        info!(task = %task, company = %profile.name, "Generating questions");

        let prompt = question_generation_prompt(task, profile);
        let raw = match self.client.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(task = %task, error = %e, "Question generation failed, using fallback");
                return Outcome::Fallback {
                    value: fallback_question_set(),
                    reason: FallbackReason::Backend(e),
                };
            }
        };

        let cleaned = strip_code_fence(&raw);
        debug!(response = cleaned, "Cleaned question payload");

        match parse_questions(cleaned) {
            Ok(questions) => {
                let set = QuestionSet::new(questions);
                if !set.covers_required_kinds() {
                    warn!(
                        task = %task,
                        count = set.len(),
                        "Generated questions do not cover MCQ, Radio and Input"
                    );
                }
                info!(task = %task, count = set.len(), "Generated valid questions");
                Outcome::Completed(set)
            }
            Err(e) => {
                warn!(task = %task, error = %e, "Unusable question payload, using fallback");
                Outcome::Fallback {
                    value: fallback_question_set(),
                    reason: FallbackReason::Invalid(e),
                }
            }
        }
    }
}

/// Strip an optional triple-backtick fence (labeled `json` or unlabeled).
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse and validate a generated question payload.
///
/// Items missing `type` or `question`, with an unknown `type`, or MCQ/Radio
/// items with fewer than two string options are dropped. Input items always
/// get an empty option list. At most `MAX_QUESTIONS` items are kept, in
/// generation order.
pub fn parse_questions(text: &str) -> Result<Vec<Question>, ValidationError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ValidationError::Json(e.to_string()))?;
    let items = value.as_array().ok_or(ValidationError::NotAnArray)?;

    let questions: Vec<Question> = items
        .iter()
        .filter_map(validate_item)
        .take(MAX_QUESTIONS)
        .collect();

    if questions.is_empty() {
        return Err(ValidationError::NoValidQuestions);
    }
    Ok(questions)
}

fn validate_item(item: &Value) -> Option<Question> {
    let kind = QuestionKind::from_label(item.get("type")?.as_str()?)?;
    let text = item.get("question")?.as_str()?;

    if !kind.has_options() {
        return Some(Question::input(text));
    }

    let options: Vec<String> = item
        .get("options")?
        .as_array()?
        .iter()
        .filter_map(|o| o.as_str().map(String::from))
        .collect();
    // A choice needs at least two options.
    if options.len() < MIN_CHOICE_OPTIONS {
        return None;
    }

    Some(match kind {
        QuestionKind::Mcq => Question::mcq(text, options),
        _ => Question::radio(text, options),
    })
}

/// The fixed question set used whenever generation fails.
pub fn fallback_question_set() -> QuestionSet {
    info!("Using fallback questions");
    QuestionSet::new(vec![
        Question::mcq(
            "What is the company's main focus?",
            vec![
                "AI".to_string(),
                "Finance".to_string(),
                "Retail".to_string(),
                "Healthcare".to_string(),
            ],
        ),
        Question::radio(
            "Is the company profitable?",
            vec!["Yes".to_string(), "No".to_string(), "Unsure".to_string()],
        ),
        Question::input("Describe your key product."),
    ])
}
