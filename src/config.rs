//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Load a `.env` file from the working directory if one exists.
///
/// Missing files are ignored; variables already set in the environment win.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Application configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    /// Optional pass-through timeout applied to every completion call.
    pub completion_timeout: Option<Duration>,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// - `TASK_INTERVIEW_BACKEND`: `gemini` (default), `anthropic` or `openai`
    /// - `GEMINI_API_KEY` / `ANTHROPIC_API_KEY` / `OPENAI_API_KEY`
    /// - `TASK_INTERVIEW_MODEL`, `TASK_INTERVIEW_MAX_TOKENS`,
    ///   `TASK_INTERVIEW_TEMPERATURE`, `TASK_INTERVIEW_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("TASK_INTERVIEW_BACKEND") {
            Some(raw) => raw.parse::<LlmBackend>()?,
            None => LlmBackend::Gemini,
        };

        let key_var = backend.api_key_var();
        let api_key = lookup(key_var)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = lookup("TASK_INTERVIEW_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| backend.default_model().to_string());

        let max_tokens = match lookup("TASK_INTERVIEW_MAX_TOKENS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TASK_INTERVIEW_MAX_TOKENS".into(),
                message: format!("expected a positive integer, got {raw:?}"),
            })?,
            None => 2048,
        };

        let temperature = match lookup("TASK_INTERVIEW_TEMPERATURE") {
            Some(raw) => Some(raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TASK_INTERVIEW_TEMPERATURE".into(),
                message: format!("expected a number, got {raw:?}"),
            })?),
            None => None,
        };

        let completion_timeout = match lookup("TASK_INTERVIEW_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "TASK_INTERVIEW_TIMEOUT_SECS".into(),
                    message: format!("expected whole seconds, got {raw:?}"),
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: SecretString::from(api_key),
                model,
                max_tokens,
                temperature,
            },
            completion_timeout,
        })
    }
}
