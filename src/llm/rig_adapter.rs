//! Bridge from rig's `Prompt` trait to `CompletionClient`.

use async_trait::async_trait;
use rig::completion::Prompt;

use crate::error::CompletionError;
use crate::llm::CompletionClient;

/// Wraps a rig agent (or anything else that implements `Prompt`).
pub struct RigAdapter<P> {
    agent: P,
    provider: &'static str,
    model_name: String,
}

impl<P> RigAdapter<P> {
    pub fn new(agent: P, provider: &'static str, model_name: &str) -> Self {
        Self {
            agent,
            provider,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<P> CompletionClient for RigAdapter<P>
where
    P: Prompt + Send + Sync,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let text = self
            .agent
            .prompt(prompt.to_string())
            .await
            .map_err(|e| CompletionError::RequestFailed {
                provider: self.provider.to_string(),
                reason: e.to_string(),
            })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(CompletionError::EmptyResponse {
                provider: self.provider.to_string(),
            });
        }

        tracing::debug!(
            provider = self.provider,
            model = %self.model_name,
            chars = text.len(),
            "Completion received"
        );
        Ok(text.to_string())
    }
}
