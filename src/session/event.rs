//! Session events and the transitions they produce.

use serde::Serialize;

use crate::interview::model::{Profile, Task};

/// A discrete user action fed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ProfileSubmitted(Profile),
    TaskSelected(Task),
    AnswerSubmitted(String),
    AnalysisRequested,
    FollowUpSubmitted(String),
    RatingSubmitted { turn_index: usize, rating: u8 },
    /// Clear history for the current profile.
    Reset,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProfileSubmitted(_) => "profile_submitted",
            Self::TaskSelected(_) => "task_selected",
            Self::AnswerSubmitted(_) => "answer_submitted",
            Self::AnalysisRequested => "analysis_requested",
            Self::FollowUpSubmitted(_) => "follow_up_submitted",
            Self::RatingSubmitted { .. } => "rating_submitted",
            Self::Reset => "reset",
        }
    }
}

/// Where the active question set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Cache,
    Generated,
    Fallback,
}

/// What an accepted event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    ProfileCommitted,
    /// The submitted profile equals the current one; nothing changed.
    ProfileUnchanged,
    QuestionsReady { source: QuestionSource, count: usize },
    /// The selected task is already active; nothing changed.
    TaskUnchanged,
    AnswerRecorded { remaining: usize },
    AnalysisReady,
    /// Analysis failed; the error is recorded and the request can be retried.
    AnalysisFailed { error: String },
    FollowUpAnswered { remaining: u32, substituted: bool },
    RatingRecorded { turn_index: usize, rating: u8 },
    /// A rating already existed for the turn and was kept.
    RatingKept { turn_index: usize, existing: u8 },
    Cleared,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_snake_case() {
        let events = [
            SessionEvent::ProfileSubmitted(Profile::default()),
            SessionEvent::TaskSelected(Task::StrategicPlanning),
            SessionEvent::AnswerSubmitted("x".into()),
            SessionEvent::AnalysisRequested,
            SessionEvent::FollowUpSubmitted("x".into()),
            SessionEvent::RatingSubmitted {
                turn_index: 0,
                rating: 3,
            },
            SessionEvent::Reset,
        ];
        for event in events {
            let name = event.name();
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{name}");
        }
    }

    #[test]
    fn question_source_serde() {
        assert_eq!(
            serde_json::to_string(&QuestionSource::Fallback).unwrap(),
            "\"fallback\""
        );
    }
}
