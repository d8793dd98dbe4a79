//! Explicit results for backend work whose failures are absorbed.

use crate::error::{CompletionError, ValidationError};

/// Why a substitute value was used instead of backend output.
#[derive(Debug, Clone)]
pub enum FallbackReason {
    /// The backend call itself failed.
    Backend(CompletionError),
    /// The backend answered but its payload was unusable.
    Invalid(ValidationError),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(e) => write!(f, "{e}"),
            Self::Invalid(e) => write!(f, "{e}"),
        }
    }
}

/// Result of a backend-driven operation.
///
/// Distinguishes "backend returned usable data" from "backend failed and a
/// substitute was used" from "backend failed and nothing could be substituted".
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Completed(T),
    Fallback { value: T, reason: FallbackReason },
    /// Descriptive, user-facing error text.
    Failed(String),
}

impl<T> Outcome<T> {
    /// The usable value, whether real or substituted.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Completed(value) | Self::Fallback { value, .. } => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Whether the backend actually answered, and so counts as a call.
    pub fn counts_as_call(&self) -> bool {
        match self {
            Self::Completed(_) => true,
            Self::Fallback {
                reason: FallbackReason::Invalid(_),
                ..
            } => true,
            Self::Fallback {
                reason: FallbackReason::Backend(_),
                ..
            }
            | Self::Failed(_) => false,
        }
    }
}
