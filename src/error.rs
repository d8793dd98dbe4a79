//! Error types for Task Interview.

use std::time::Duration;

/// Top-level error type for the interview service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures of the text-completion backend.
///
/// This layer never retries; callers decide what a failure means.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Completion timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Provider {provider} returned an empty response")]
    EmptyResponse { provider: String },
}

/// A generated question payload that could not be used.
///
/// Only ever carried inside a fallback outcome; never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Generated questions are not valid JSON: {0}")]
    Json(String),

    #[error("Generated questions are not a JSON array")]
    NotAnArray,

    #[error("No generated question passed validation")]
    NoValidQuestions,
}

/// Errors raised by the session orchestrator for rejected user actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("{event} is not valid in phase {phase}")]
    PhaseViolation { event: String, phase: String },

    #[error("Profile requires at least a name and an industry")]
    IncompleteProfile,

    #[error("Please provide an answer")]
    EmptyAnswer,

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Follow-up limit of {max} reached")]
    FollowUpLimitReached { max: u32 },

    #[error("Rating {rating} is outside 1..=5")]
    InvalidRating { rating: u8 },

    #[error("Turn {index} cannot be rated")]
    NotRateable { index: usize },

    #[error("Another action is still in progress for this session")]
    Busy,
}

/// Result type alias for the interview service.
pub type Result<T> = std::result::Result<T, Error>;
