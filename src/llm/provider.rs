//! The completion seam every backend implements.

use async_trait::async_trait;

use crate::error::CompletionError;

/// Opaque text-completion capability.
///
/// One prompt in, one response text out. Implementations perform no
/// retries; a failed call returns `CompletionError` and the caller decides
/// whether to substitute, record, or retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier used for logging.
    fn model_name(&self) -> &str;

    /// Complete a prompt and return the response text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
