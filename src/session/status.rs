//! Read-only session snapshot for presentation layers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::interview::model::{Profile, Task};

use super::state::{MAX_FOLLOW_UPS, Phase, SessionState};

/// Everything a UI needs to render progress, errors, and ratings.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    pub questions_asked: usize,
    pub question_count: usize,
    pub final_response_generated: bool,
    pub follow_ups_used: u32,
    pub max_follow_ups: u32,
    pub progress: f64,
    pub current_step: usize,
    pub total_steps: usize,
    pub call_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub ratings: BTreeMap<usize, u8>,
}

impl SessionStatus {
    pub fn from_state(session_id: Uuid, started_at: DateTime<Utc>, state: &SessionState) -> Self {
        let (current_step, total_steps) = state.steps();
        Self {
            session_id,
            started_at,
            phase: state.phase(),
            profile: state.profile().cloned(),
            task: state.task(),
            questions_asked: state.questions_asked(),
            question_count: state.question_count(),
            final_response_generated: state.final_response_generated(),
            follow_ups_used: state.follow_up_count(),
            max_follow_ups: MAX_FOLLOW_UPS,
            progress: state.progress(),
            current_step,
            total_steps,
            call_count: state.call_count(),
            last_error: state.last_error().map(String::from),
            ratings: state.ratings().clone(),
        }
    }

    /// `Step n of m` label for progress displays.
    pub fn step_label(&self) -> String {
        format!("Step {} of {}", self.current_step, self.total_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_status() {
        let status = SessionStatus::from_state(Uuid::new_v4(), Utc::now(), &SessionState::new());
        assert_eq!(status.phase, Phase::AwaitingProfile);
        assert_eq!(status.step_label(), "Step 0 of 13");
        assert_eq!(status.max_follow_ups, 5);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["phase"], "awaiting_profile");
        assert!(json.get("task").is_none());
        assert!(json.get("last_error").is_none());
    }
}
