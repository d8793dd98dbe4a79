//! Session state machine — phases and the session aggregate.
//!
//! Every change to `SessionState` goes through a `with_*` transform that
//! consumes the old state and returns the new one, so resets and phase
//! changes happen in one place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::interview::model::{Answer, Profile, QuestionKind, QuestionSet, Task, Turn};
use crate::interview::QuestionCache;

/// Follow-up exchanges allowed after the final analysis.
pub const MAX_FOLLOW_UPS: u32 = 5;

/// Question steps assumed by the progress metric when the set is shorter.
const MIN_QUESTION_STEPS: usize = 7;

/// The phases of an interview session.
///
/// AwaitingProfile → AwaitingTask → AwaitingQuestions → Questioning →
/// AwaitingAnalysis → FollowUp → Concluded. A new profile or task can
/// interrupt any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingProfile,
    AwaitingTask,
    AwaitingQuestions,
    Questioning,
    AwaitingAnalysis,
    FollowUp,
    Concluded,
}

impl Phase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        use Phase::*;
        match (self, target) {
            // Profile commit, profile change, or reset
            (_, AwaitingTask) => true,
            // Reset before any profile was committed
            (AwaitingProfile, AwaitingProfile) => true,
            // Task selection from anywhere past the profile
            (from, AwaitingQuestions) => *from != AwaitingProfile,
            (from, to) => matches!(
                (from, to),
                (AwaitingQuestions, Questioning)
                    | (AwaitingQuestions, AwaitingAnalysis)
                    | (Questioning, Questioning)
                    | (Questioning, AwaitingAnalysis)
                    | (AwaitingAnalysis, AwaitingAnalysis)
                    | (AwaitingAnalysis, FollowUp)
                    | (FollowUp, FollowUp)
                    | (FollowUp, Concluded)
            ),
        }
    }

    /// Whether no further input is accepted for the current task.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Concluded)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::AwaitingProfile
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingProfile => "awaiting_profile",
            Self::AwaitingTask => "awaiting_task",
            Self::AwaitingQuestions => "awaiting_questions",
            Self::Questioning => "questioning",
            Self::AwaitingAnalysis => "awaiting_analysis",
            Self::FollowUp => "follow_up",
            Self::Concluded => "concluded",
        };
        write!(f, "{s}")
    }
}

/// The session aggregate.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    profile: Option<Profile>,
    task: Option<Task>,
    phase: Phase,
    questions: Option<QuestionSet>,
    answers: Vec<Answer>,
    conversation: Vec<Turn>,
    final_response_generated: bool,
    follow_up_count: u32,
    ratings: BTreeMap<usize, u8>,
    call_count: u64,
    last_error: Option<String>,
    cache: QuestionCache,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn task(&self) -> Option<Task> {
        self.task
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions(&self) -> Option<&QuestionSet> {
        self.questions.as_ref()
    }

    pub fn question_count(&self) -> usize {
        self.questions.as_ref().map_or(0, QuestionSet::len)
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Questions answered so far. Always equal to `answers().len()`.
    pub fn questions_asked(&self) -> usize {
        self.answers.len()
    }

    /// The question awaiting an answer, while in `Questioning`.
    pub fn current_question(&self) -> Option<&crate::interview::Question> {
        if self.phase != Phase::Questioning {
            return None;
        }
        self.questions.as_ref()?.get(self.questions_asked())
    }

    pub fn conversation(&self) -> &[Turn] {
        &self.conversation
    }

    pub fn final_response_generated(&self) -> bool {
        self.final_response_generated
    }

    pub fn follow_up_count(&self) -> u32 {
        self.follow_up_count
    }

    pub fn follow_ups_remaining(&self) -> u32 {
        MAX_FOLLOW_UPS.saturating_sub(self.follow_up_count)
    }

    pub fn ratings(&self) -> &BTreeMap<usize, u8> {
        &self.ratings
    }

    pub fn rating(&self, turn_index: usize) -> Option<u8> {
        self.ratings.get(&turn_index).copied()
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn cache(&self) -> &QuestionCache {
        &self.cache
    }

    /// Steps completed and total steps for the progress display.
    pub fn steps(&self) -> (usize, usize) {
        let current = self.questions_asked()
            + usize::from(self.final_response_generated)
            + self.follow_up_count as usize;
        let total = self.question_count().max(MIN_QUESTION_STEPS) + 1 + MAX_FOLLOW_UPS as usize;
        (current, total)
    }

    /// Advisory progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let (current, total) = self.steps();
        (current as f64 / total as f64).min(1.0)
    }

    // ── Transforms ──────────────────────────────────────────────────────

    /// Commit a new profile: everything except the call counter is reset.
    pub fn with_profile(self, profile: Profile) -> Self {
        Self {
            profile: Some(profile),
            phase: Phase::AwaitingTask,
            call_count: self.call_count,
            ..Self::default()
        }
    }

    /// Select a task: task-scoped fields reset, profile and cache kept.
    pub fn with_task(self, task: Task) -> Self {
        Self {
            profile: self.profile,
            task: Some(task),
            phase: Phase::AwaitingQuestions,
            call_count: self.call_count,
            cache: self.cache,
            ..Self::default()
        }
    }

    /// Clear history: everything but the committed profile is dropped.
    pub fn cleared(self) -> Self {
        let phase = if self.profile.is_some() {
            Phase::AwaitingTask
        } else {
            Phase::AwaitingProfile
        };
        Self {
            profile: self.profile,
            phase,
            ..Self::default()
        }
    }

    /// Install the question set for the current task and start questioning.
    ///
    /// The set is stored in the cache unless an entry already exists; the
    /// cached set wins.
    pub fn with_questions(mut self, set: QuestionSet) -> Self {
        let set = match (self.task, self.profile.as_ref()) {
            (Some(task), Some(profile)) => self.cache.put(task, profile, set),
            _ => set,
        };
        self.phase = if set.is_empty() {
            Phase::AwaitingAnalysis
        } else {
            Phase::Questioning
        };
        self.questions = Some(set);
        self
    }

    /// Record the answer to the current question.
    ///
    /// Appends the question and answer turns; moves to `AwaitingAnalysis`
    /// once every question is answered.
    pub fn with_answer(mut self, question: &str, kind: QuestionKind, answer: String) -> Self {
        self.conversation.push(Turn::assistant(question));
        self.conversation.push(Turn::user(answer.clone()));
        self.answers.push(Answer {
            question: question.to_string(),
            answer,
            kind,
        });
        if self.questions_asked() >= self.question_count() {
            self.phase = Phase::AwaitingAnalysis;
        }
        self
    }

    /// Append the final analysis and open the follow-up phase.
    pub fn with_final_response(mut self, analysis: String) -> Self {
        self.conversation.push(Turn::response(analysis));
        self.final_response_generated = true;
        self.last_error = None;
        self.phase = Phase::FollowUp;
        self
    }

    /// Record a failed analysis; answers and conversation are untouched.
    pub fn with_analysis_error(mut self, error: String) -> Self {
        self.last_error = Some(error);
        self.phase = Phase::AwaitingAnalysis;
        self
    }

    /// Append one follow-up exchange and consume a follow-up slot.
    pub fn with_follow_up(mut self, input: String, reply: String) -> Self {
        self.conversation.push(Turn::user(input));
        self.follow_up_count += 1;
        self.conversation.push(Turn::response(reply));
        if self.follow_up_count >= MAX_FOLLOW_UPS {
            self.phase = Phase::Concluded;
        }
        self
    }

    /// Record a rating; an existing rating for the turn is kept.
    pub fn with_rating(mut self, turn_index: usize, rating: u8) -> Self {
        self.ratings.entry(turn_index).or_insert(rating);
        self
    }

    /// Count one completed backend call.
    pub fn with_call_recorded(mut self) -> Self {
        self.call_count += 1;
        self
    }
}
