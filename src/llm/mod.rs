//! Text-completion backends for Task Interview.
//!
//! Supports:
//! - **Gemini**: Direct API access via rig-core
//! - **Anthropic**: Direct API access via rig-core
//! - **OpenAI**: Direct API access via rig-core
//!
//! Uses the rig-core crate for HTTP transport and the `RigAdapter` to bridge
//! rig's `Prompt` trait to our `CompletionClient` trait.

pub mod provider;
mod rig_adapter;
pub mod timeout;

pub use provider::CompletionClient;
pub use rig_adapter::RigAdapter;
pub use timeout::TimeoutClient;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rig::client::CompletionClient as _;
use secrecy::ExposeSecret;

use crate::error::{CompletionError, ConfigError};

/// Supported completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    /// Environment variable holding the API key for this backend.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
        }
    }
}

impl FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::InvalidValue {
                key: "TASK_INTERVIEW_BACKEND".into(),
                message: format!("unknown backend {other:?} (expected gemini, anthropic or openai)"),
            }),
        }
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        };
        write!(f, "{s}")
    }
}

/// Configuration for creating a completion client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
    pub max_tokens: u64,
    pub temperature: Option<f64>,
}

// Every rig client exposes the same agent builder; only construction differs.
macro_rules! rig_agent_client {
    ($client:expr, $provider:literal, $config:expr) => {{
        let mut builder = $client
            .agent(&$config.model)
            .max_tokens($config.max_tokens);
        if let Some(temperature) = $config.temperature {
            builder = builder.temperature(temperature);
        }
        tracing::info!("Using {} (model: {})", $provider, $config.model);
        Arc::new(RigAdapter::new(builder.build(), $provider, &$config.model))
            as Arc<dyn CompletionClient>
    }};
}

/// Create a completion client from configuration.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    match config.backend {
        LlmBackend::Gemini => create_gemini_client(config),
        LlmBackend::Anthropic => create_anthropic_client(config),
        LlmBackend::OpenAi => create_openai_client(config),
    }
}

/// Create a completion client, wrapped in a timeout when one is configured.
pub fn create_client_with_timeout(
    config: &LlmConfig,
    timeout: Option<Duration>,
) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    let client = create_client(config)?;
    Ok(match timeout {
        Some(after) => Arc::new(TimeoutClient::new(client, after)),
        None => client,
    })
}

fn create_gemini_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    use rig::providers::gemini;

    let client: gemini::Client =
        gemini::Client::new(config.api_key.expose_secret()).map_err(|e| {
            CompletionError::RequestFailed {
                provider: "gemini".to_string(),
                reason: format!("Failed to create Gemini client: {}", e),
            }
        })?;
    Ok(rig_agent_client!(client, "gemini", config))
}

fn create_anthropic_client(
    config: &LlmConfig,
) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret()).map_err(|e| {
            CompletionError::RequestFailed {
                provider: "anthropic".to_string(),
                reason: format!("Failed to create Anthropic client: {}", e),
            }
        })?;
    Ok(rig_agent_client!(client, "anthropic", config))
}

fn create_openai_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            CompletionError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            }
        })?;
    Ok(rig_agent_client!(client, "openai", config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: LlmBackend, model: &str) -> LlmConfig {
        LlmConfig {
            backend,
            api_key: secrecy::SecretString::from("test-key"),
            model: model.to_string(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn test_create_client_missing_key_still_constructs() {
        // rig-core clients accept any string as API key at construction time.
        // The actual auth failure happens when making a request.
        let client = create_client(&config(LlmBackend::Anthropic, "claude-3-5-sonnet-latest"));
        assert!(client.is_ok());
        assert_eq!(client.unwrap().model_name(), "claude-3-5-sonnet-latest");
    }

    #[tokio::test]
    async fn test_create_gemini_client() {
        let client = create_client(&config(LlmBackend::Gemini, "gemini-2.0-flash"));
        assert!(client.is_ok());
        assert_eq!(client.unwrap().model_name(), "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn test_create_client_with_timeout_keeps_model_name() {
        let client = create_client_with_timeout(
            &config(LlmBackend::OpenAi, "gpt-4o"),
            Some(Duration::from_secs(5)),
        );
        assert_eq!(client.unwrap().model_name(), "gpt-4o");
    }

    #[test]
    fn backend_parse_and_display_agree() {
        for backend in [LlmBackend::Gemini, LlmBackend::Anthropic, LlmBackend::OpenAi] {
            let parsed: LlmBackend = backend.to_string().parse().unwrap();
            assert_eq!(parsed, backend);
        }
        assert_eq!("Claude".parse::<LlmBackend>().unwrap(), LlmBackend::Anthropic);
        assert!("mistral".parse::<LlmBackend>().is_err());
    }
}
