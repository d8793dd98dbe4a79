//! Pass-through timeout at the completion boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CompletionError;
use crate::llm::CompletionClient;

/// Fails a completion with `CompletionError::Timeout` once `after` elapses.
pub struct TimeoutClient {
    inner: Arc<dyn CompletionClient>,
    after: Duration,
}

impl TimeoutClient {
    pub fn new(inner: Arc<dyn CompletionClient>, after: Duration) -> Self {
        Self { inner, after }
    }
}

#[async_trait]
impl CompletionClient for TimeoutClient {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        match tokio::time::timeout(self.after, self.inner.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    model = self.inner.model_name(),
                    after = ?self.after,
                    "Completion call timed out"
                );
                Err(CompletionError::Timeout { after: self.after })
            }
        }
    }
}
