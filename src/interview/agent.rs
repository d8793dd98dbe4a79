//! Per-task agent producing the final analysis and follow-up replies.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::CompletionError;
use crate::llm::CompletionClient;

use super::model::{Answer, Profile, Task, Turn};
use super::outcome::{FallbackReason, Outcome};
use super::prompts::{final_analysis_prompt, follow_up_prompt};

/// Substituted reply when a follow-up call fails.
pub const FOLLOW_UP_APOLOGY: &str = "Unable to process follow-up question.";

/// Task persona wrapping the completion client. Both operations are
/// single-shot; retrying is the caller's decision.
#[derive(Clone)]
pub struct TaskAgent {
    task: Task,
    client: Arc<dyn CompletionClient>,
}

impl TaskAgent {
    pub fn new(task: Task, client: Arc<dyn CompletionClient>) -> Self {
        Self { task, client }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    /// Produce the final analysis. Failures become `Outcome::Failed` with a
    /// descriptive message.
    pub async fn final_analysis(
        &self,
        history: &[Turn],
        profile: &Profile,
        answers: &[Answer],
    ) -> Outcome<String> {
        let prompt = final_analysis_prompt(self.task, profile, answers, history);
        match self.client.complete(&prompt).await {
            Ok(text) => {
                info!(task = %self.task, chars = text.len(), "Final analysis generated");
                Outcome::Completed(text)
            }
            Err(e) => {
                warn!(task = %self.task, error = %e, "Final analysis failed");
                Outcome::Failed(analysis_error_message(&e))
            }
        }
    }

    /// Answer a follow-up. Failures substitute `FOLLOW_UP_APOLOGY`.
    pub async fn follow_up(
        &self,
        history: &[Turn],
        profile: &Profile,
        user_input: &str,
    ) -> Outcome<String> {
        let prompt = follow_up_prompt(self.task, profile, user_input, history);
        match self.client.complete(&prompt).await {
            Ok(text) => {
                info!(task = %self.task, chars = text.len(), "Follow-up answered");
                Outcome::Completed(text)
            }
            Err(e) => {
                warn!(task = %self.task, error = %e, "Follow-up failed, substituting apology");
                Outcome::Fallback {
                    value: FOLLOW_UP_APOLOGY.to_string(),
                    reason: FallbackReason::Backend(e),
                }
            }
        }
    }
}

fn analysis_error_message(error: &CompletionError) -> String {
    format!("Failed to generate analysis: {error}")
}
