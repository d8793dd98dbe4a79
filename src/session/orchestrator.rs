//! SessionOrchestrator — drives the interview state machine.
//!
//! Each `SessionEvent` is validated against the current phase, any backend
//! work it needs is awaited, and the result is applied to `SessionState`
//! through one of its transforms. `SessionHandle` adds a single-flight guard
//! so a second action is rejected while a completion call is outstanding.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::interview::model::{Profile, QuestionKind, Task};
use crate::interview::{Outcome, QuestionSetGenerator, TaskAgent};
use crate::llm::CompletionClient;

use super::event::{QuestionSource, SessionEvent, Transition};
use super::state::{MAX_FOLLOW_UPS, Phase, SessionState};
use super::status::SessionStatus;
use super::transcript::{export_transcript, save_transcript};

/// Owns one interview session and every piece of mutable state in it.
pub struct SessionOrchestrator {
    id: Uuid,
    started_at: DateTime<Utc>,
    state: SessionState,
    client: Arc<dyn CompletionClient>,
    generator: QuestionSetGenerator,
    agent: Option<TaskAgent>,
}

impl SessionOrchestrator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, model = client.model_name(), "Session created");
        Self {
            id,
            started_at: Utc::now(),
            state: SessionState::new(),
            generator: QuestionSetGenerator::new(Arc::clone(&client)),
            client,
            agent: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Apply one user action.
    pub async fn dispatch(&mut self, event: SessionEvent) -> Result<Transition, SessionError> {
        let name = event.name();
        let from = self.state.phase();

        let result = match event {
            SessionEvent::ProfileSubmitted(profile) => self.submit_profile(profile),
            SessionEvent::TaskSelected(task) => self.select_task(task).await,
            SessionEvent::AnswerSubmitted(answer) => self.submit_answer(answer),
            SessionEvent::AnalysisRequested => self.request_analysis().await,
            SessionEvent::FollowUpSubmitted(input) => self.submit_follow_up(input).await,
            SessionEvent::RatingSubmitted { turn_index, rating } => self.rate(turn_index, rating),
            SessionEvent::Reset => Ok(self.reset()),
        };

        match &result {
            Ok(transition) => debug!(
                session = %self.id,
                event = name,
                from = %from,
                to = %self.state.phase(),
                ?transition,
                "Event applied"
            ),
            Err(e) => warn!(session = %self.id, event = name, phase = %from, error = %e, "Event rejected"),
        }
        result
    }

    /// Current status for a presentation layer.
    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_state(self.id, self.started_at, &self.state)
    }

    /// The conversation as pretty JSON.
    pub fn export_transcript(&self) -> Result<String, serde_json::Error> {
        export_transcript(self.state.conversation())
    }

    // ── Event handlers ──────────────────────────────────────────────────

    fn submit_profile(&mut self, profile: Profile) -> Result<Transition, SessionError> {
        if !profile.is_complete() {
            return Err(SessionError::IncompleteProfile);
        }
        if self.state.profile() == Some(&profile) {
            return Ok(Transition::ProfileUnchanged);
        }

        info!(session = %self.id, company = %profile.name, "Profile changed, resetting session");
        self.agent = None;
        self.apply(|s| s.with_profile(profile));
        Ok(Transition::ProfileCommitted)
    }

    async fn select_task(&mut self, task: Task) -> Result<Transition, SessionError> {
        let phase = self.state.phase();
        if phase == Phase::AwaitingProfile {
            return Err(self.violation("task_selected"));
        }
        if self.state.task() == Some(task) && phase != Phase::AwaitingQuestions {
            return Ok(Transition::TaskUnchanged);
        }

        info!(session = %self.id, task = %task, "Task selected");
        self.agent = Some(TaskAgent::new(task, Arc::clone(&self.client)));
        self.apply(|s| s.with_task(task));

        let profile = self.state.profile().cloned().unwrap_or_default();
        let (set, source) = match self.state.cache().get(task, &profile) {
            Some(set) => {
                info!(session = %self.id, task = %task, "Question cache hit");
                (set, QuestionSource::Cache)
            }
            None => {
                info!(session = %self.id, task = %task, "Question cache miss, generating");
                let outcome = self.generator.generate(task, &profile).await;
                if outcome.counts_as_call() {
                    self.record_call();
                }
                let source = if outcome.is_fallback() {
                    QuestionSource::Fallback
                } else {
                    QuestionSource::Generated
                };
                match outcome.into_value() {
                    Some(set) => (set, source),
                    None => (crate::interview::fallback_question_set(), QuestionSource::Fallback),
                }
            }
        };

        let count = set.len();
        self.apply(|s| s.with_questions(set));
        Ok(Transition::QuestionsReady { source, count })
    }

    fn submit_answer(&mut self, answer: String) -> Result<Transition, SessionError> {
        let question = self
            .state
            .current_question()
            .cloned()
            .ok_or_else(|| self.violation("answer_submitted"))?;

        let answer = match question.kind() {
            QuestionKind::Input if answer.trim().is_empty() => {
                return Err(SessionError::EmptyAnswer);
            }
            // Choice questions never block; an empty pick takes the first option.
            QuestionKind::Mcq | QuestionKind::Radio if answer.trim().is_empty() => question
                .options()
                .first()
                .cloned()
                .unwrap_or_default(),
            _ => answer,
        };

        self.apply(|s| s.with_answer(question.text(), question.kind(), answer));

        let remaining = self.state.question_count() - self.state.questions_asked();
        if remaining == 0 {
            info!(session = %self.id, "All questions answered, proceeding to analysis");
        }
        Ok(Transition::AnswerRecorded { remaining })
    }

    async fn request_analysis(&mut self) -> Result<Transition, SessionError> {
        if self.state.phase() != Phase::AwaitingAnalysis {
            return Err(self.violation("analysis_requested"));
        }
        let agent = self
            .agent
            .clone()
            .ok_or_else(|| self.violation("analysis_requested"))?;
        let profile = self.state.profile().cloned().unwrap_or_default();

        let outcome = agent
            .final_analysis(self.state.conversation(), &profile, self.state.answers())
            .await;
        if outcome.counts_as_call() {
            self.record_call();
        }

        match outcome {
            Outcome::Completed(analysis) | Outcome::Fallback { value: analysis, .. } => {
                self.apply(|s| s.with_final_response(analysis));
                Ok(Transition::AnalysisReady)
            }
            Outcome::Failed(error) => {
                warn!(session = %self.id, error = %error, "Analysis failed, retry allowed");
                self.apply(|s| s.with_analysis_error(error.clone()));
                Ok(Transition::AnalysisFailed { error })
            }
        }
    }

    async fn submit_follow_up(&mut self, input: String) -> Result<Transition, SessionError> {
        match self.state.phase() {
            Phase::FollowUp => {}
            Phase::Concluded => {
                return Err(SessionError::FollowUpLimitReached {
                    max: MAX_FOLLOW_UPS,
                });
            }
            _ => return Err(self.violation("follow_up_submitted")),
        }
        if input.trim().is_empty() {
            return Err(SessionError::EmptyAnswer);
        }
        let agent = self
            .agent
            .clone()
            .ok_or_else(|| self.violation("follow_up_submitted"))?;
        let profile = self.state.profile().cloned().unwrap_or_default();

        // The history sent to the agent includes the new question.
        let mut history = self.state.conversation().to_vec();
        history.push(crate::interview::Turn::user(input.clone()));

        let outcome = agent.follow_up(&history, &profile, &input).await;
        if outcome.counts_as_call() {
            self.record_call();
        }
        let substituted = !outcome.is_completed();
        let reply = match outcome {
            Outcome::Completed(reply) | Outcome::Fallback { value: reply, .. } => reply,
            Outcome::Failed(error) => error,
        };

        self.apply(|s| s.with_follow_up(input, reply));
        let remaining = self.state.follow_ups_remaining();
        if remaining == 0 {
            info!(session = %self.id, "Follow-up limit reached");
        }
        Ok(Transition::FollowUpAnswered {
            remaining,
            substituted,
        })
    }

    fn rate(&mut self, turn_index: usize, rating: u8) -> Result<Transition, SessionError> {
        if !(1..=5).contains(&rating) {
            return Err(SessionError::InvalidRating { rating });
        }
        let rateable = self
            .state
            .conversation()
            .get(turn_index)
            .is_some_and(|turn| turn.is_rateable());
        if !rateable {
            return Err(SessionError::NotRateable { index: turn_index });
        }

        if let Some(existing) = self.state.rating(turn_index) {
            return Ok(Transition::RatingKept {
                turn_index,
                existing,
            });
        }
        self.apply(|s| s.with_rating(turn_index, rating));
        info!(session = %self.id, turn_index, rating, "Response rated");
        Ok(Transition::RatingRecorded { turn_index, rating })
    }

    fn reset(&mut self) -> Transition {
        info!(session = %self.id, "Clearing history");
        self.agent = None;
        self.apply(SessionState::cleared);
        Transition::Cleared
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn apply(&mut self, transform: impl FnOnce(SessionState) -> SessionState) {
        let from = self.state.phase();
        self.state = transform(std::mem::take(&mut self.state));
        let to = self.state.phase();
        if from != to {
            debug_assert!(from.can_transition_to(to), "illegal transition {from} -> {to}");
            info!(session = %self.id, from = %from, to = %to, "Phase transition");
        }
    }

    fn record_call(&mut self) {
        self.state = std::mem::take(&mut self.state).with_call_recorded();
        info!(session = %self.id, count = self.state.call_count(), "Completion call count incremented");
    }

    fn violation(&self, event: &str) -> SessionError {
        SessionError::PhaseViolation {
            event: event.to_string(),
            phase: self.state.phase().to_string(),
        }
    }
}

/// Shared, single-flight handle to a session.
///
/// `dispatch` refuses with `SessionError::Busy` while another action on the
/// same session is still running.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionOrchestrator>>,
}

impl SessionHandle {
    pub fn new(orchestrator: SessionOrchestrator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(orchestrator)),
        }
    }

    pub async fn dispatch(&self, event: SessionEvent) -> Result<Transition, SessionError> {
        let mut session = self.inner.try_lock().map_err(|_| {
            warn!(event = event.name(), "Session busy, action rejected");
            SessionError::Busy
        })?;
        session.dispatch(event).await
    }

    /// Waits for any in-flight action to finish.
    pub async fn status(&self) -> SessionStatus {
        self.inner.lock().await.status()
    }

    /// Export the conversation and write it to `path`. Returns the number of turns saved.
    pub async fn save_transcript(&self, path: &Path) -> crate::error::Result<usize> {
        let (json, turns) = {
            let session = self.inner.lock().await;
            (
                session.export_transcript()?,
                session.state().conversation().len(),
            )
        };
        save_transcript(path, &json).await?;
        Ok(turns)
    }

    /// Read from the current state. Waits for any in-flight action.
    pub async fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(self.inner.lock().await.state())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::CompletionError;
    use crate::interview::{FOLLOW_UP_APOLOGY, Turn};

    /// Replays scripted responses in order; errors once the script runs out.
    struct ScriptedClient {
        script: StdMutex<VecDeque<Result<String, CompletionError>>>,
        calls: StdMutex<usize>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                script: StdMutex::new(script.into()),
                calls: StdMutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(backend_down()))
        }
    }

    fn backend_down() -> CompletionError {
        CompletionError::RequestFailed {
            provider: "scripted".into(),
            reason: "backend down".into(),
        }
    }

    fn acme() -> Profile {
        Profile::new("Acme", "Retail", "50", "")
    }

    async fn at_questioning(client: Arc<ScriptedClient>) -> SessionOrchestrator {
        let mut session = SessionOrchestrator::new(client);
        session
            .dispatch(SessionEvent::ProfileSubmitted(acme()))
            .await
            .unwrap();
        session
            .dispatch(SessionEvent::TaskSelected(Task::StrategicPlanning))
            .await
            .unwrap();
        session
    }

    async fn answer_all(session: &mut SessionOrchestrator) {
        while session.phase() == Phase::Questioning {
            session
                .dispatch(SessionEvent::AnswerSubmitted("Some answer".into()))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn task_before_profile_is_a_phase_violation() {
        let mut session = SessionOrchestrator::new(ScriptedClient::new(vec![]));
        let err = session
            .dispatch(SessionEvent::TaskSelected(Task::StrategicPlanning))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::PhaseViolation { .. }));
    }

    #[tokio::test]
    async fn incomplete_profile_is_rejected() {
        let mut session = SessionOrchestrator::new(ScriptedClient::new(vec![]));
        let err = session
            .dispatch(SessionEvent::ProfileSubmitted(Profile::new("Acme", "", "", "")))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::IncompleteProfile);
        assert_eq!(session.phase(), Phase::AwaitingProfile);
    }

    #[tokio::test]
    async fn backend_failure_during_generation_uses_fallback() {
        let client = ScriptedClient::new(vec![Err(backend_down())]);
        let mut session = SessionOrchestrator::new(client.clone());
        session
            .dispatch(SessionEvent::ProfileSubmitted(acme()))
            .await
            .unwrap();
        let transition = session
            .dispatch(SessionEvent::TaskSelected(Task::StrategicPlanning))
            .await
            .unwrap();

        assert_eq!(
            transition,
            Transition::QuestionsReady {
                source: QuestionSource::Fallback,
                count: 3
            }
        );
        assert_eq!(session.phase(), Phase::Questioning);
        assert_eq!(session.state().call_count(), 0);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn empty_input_answer_is_rejected_but_choice_defaults() {
        let client = ScriptedClient::new(vec![Ok("not json".into())]);
        let mut session = at_questioning(client).await;

        // Fallback set: MCQ, Radio, Input
        session
            .dispatch(SessionEvent::AnswerSubmitted(String::new()))
            .await
            .unwrap();
        assert_eq!(session.state().answers()[0].answer, "AI");

        session
            .dispatch(SessionEvent::AnswerSubmitted("Unsure".into()))
            .await
            .unwrap();
        let err = session
            .dispatch(SessionEvent::AnswerSubmitted("   ".into()))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::EmptyAnswer);
        assert_eq!(session.state().questions_asked(), 2);

        let transition = session
            .dispatch(SessionEvent::AnswerSubmitted("Running shoes".into()))
            .await
            .unwrap();
        assert_eq!(transition, Transition::AnswerRecorded { remaining: 0 });
        assert_eq!(session.phase(), Phase::AwaitingAnalysis);

        let err = session
            .dispatch(SessionEvent::AnswerSubmitted("extra".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::PhaseViolation { .. }));
        assert_eq!(session.state().answers().len(), 3);
    }

    #[tokio::test]
    async fn analysis_before_questions_done_is_rejected() {
        let client = ScriptedClient::new(vec![Ok("not json".into())]);
        let mut session = at_questioning(client).await;
        let err = session
            .dispatch(SessionEvent::AnalysisRequested)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::PhaseViolation { .. }));
    }

    #[tokio::test]
    async fn failed_follow_up_substitutes_apology_and_consumes_slot() {
        let client = ScriptedClient::new(vec![
            Ok("not json".into()),
            Ok("Final analysis".into()),
            Err(backend_down()),
        ]);
        let mut session = at_questioning(client).await;
        answer_all(&mut session).await;
        session
            .dispatch(SessionEvent::AnalysisRequested)
            .await
            .unwrap();
        let calls_before = session.state().call_count();

        let transition = session
            .dispatch(SessionEvent::FollowUpSubmitted("What next?".into()))
            .await
            .unwrap();
        assert_eq!(
            transition,
            Transition::FollowUpAnswered {
                remaining: MAX_FOLLOW_UPS - 1,
                substituted: true
            }
        );
        let last = session.state().conversation().last().unwrap();
        assert_eq!(last.content, FOLLOW_UP_APOLOGY);
        assert!(last.is_final_or_follow_up);
        assert_eq!(session.state().follow_up_count(), 1);
        assert_eq!(session.state().call_count(), calls_before);
    }

    #[tokio::test]
    async fn ratings_validate_target_and_range() {
        let client = ScriptedClient::new(vec![Ok("not json".into()), Ok("Final".into())]);
        let mut session = at_questioning(client).await;
        answer_all(&mut session).await;
        session
            .dispatch(SessionEvent::AnalysisRequested)
            .await
            .unwrap();
        let final_index = session.state().conversation().len() - 1;

        let err = session
            .dispatch(SessionEvent::RatingSubmitted {
                turn_index: 0,
                rating: 4,
            })
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::NotRateable { index: 0 });

        let err = session
            .dispatch(SessionEvent::RatingSubmitted {
                turn_index: final_index,
                rating: 6,
            })
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::InvalidRating { rating: 6 });

        let transition = session
            .dispatch(SessionEvent::RatingSubmitted {
                turn_index: final_index,
                rating: 5,
            })
            .await
            .unwrap();
        assert_eq!(
            transition,
            Transition::RatingRecorded {
                turn_index: final_index,
                rating: 5
            }
        );
    }

    #[tokio::test]
    async fn reselecting_active_task_is_a_no_op() {
        let client = ScriptedClient::new(vec![Ok("not json".into())]);
        let mut session = at_questioning(client.clone()).await;
        session
            .dispatch(SessionEvent::AnswerSubmitted("AI".into()))
            .await
            .unwrap();

        let transition = session
            .dispatch(SessionEvent::TaskSelected(Task::StrategicPlanning))
            .await
            .unwrap();
        assert_eq!(transition, Transition::TaskUnchanged);
        assert_eq!(session.state().questions_asked(), 1);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn reset_keeps_profile_and_clears_the_rest() {
        let client = ScriptedClient::new(vec![Ok("not json".into()), Ok("not json".into())]);
        let mut session = at_questioning(client.clone()).await;
        assert_eq!(session.state().call_count(), 1);

        assert_eq!(
            session.dispatch(SessionEvent::Reset).await.unwrap(),
            Transition::Cleared
        );
        assert_eq!(session.phase(), Phase::AwaitingTask);
        assert_eq!(session.state().profile(), Some(&acme()));
        assert_eq!(session.state().call_count(), 0);
        assert!(session.state().cache().is_empty());

        // Cache was cleared, so the same task generates again.
        let transition = session
            .dispatch(SessionEvent::TaskSelected(Task::StrategicPlanning))
            .await
            .unwrap();
        assert!(matches!(
            transition,
            Transition::QuestionsReady {
                source: QuestionSource::Fallback,
                ..
            }
        ));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn transcript_export_matches_conversation() {
        let mut session = at_questioning(ScriptedClient::new(vec![])).await;
        session
            .dispatch(SessionEvent::AnswerSubmitted(String::new()))
            .await
            .unwrap();

        let json = session.export_transcript().unwrap();
        let turns: Vec<Turn> = serde_json::from_str(&json).unwrap();
        assert_eq!(turns, session.state().conversation());
        assert_eq!(turns[0].content, "What is the company's main focus?");
        assert_eq!(turns[1].content, "AI");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_history.json");
        let handle = SessionHandle::new(session);
        assert_eq!(handle.save_transcript(&path).await.unwrap(), 2);
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), json);
    }

    #[tokio::test]
    async fn handle_rejects_overlapping_actions() {
        struct GatedClient {
            entered: tokio::sync::Notify,
            release: tokio::sync::Notify,
        }

        #[async_trait]
        impl CompletionClient for GatedClient {
            fn model_name(&self) -> &str {
                "gated"
            }

            async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
                self.entered.notify_one();
                self.release.notified().await;
                Ok("not json".into())
            }
        }

        let client = Arc::new(GatedClient {
            entered: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        });
        let handle = SessionHandle::new(SessionOrchestrator::new(client.clone()));
        handle
            .dispatch(SessionEvent::ProfileSubmitted(acme()))
            .await
            .unwrap();

        let background = handle.clone();
        let in_flight = tokio::spawn(async move {
            background
                .dispatch(SessionEvent::TaskSelected(Task::StrategicPlanning))
                .await
        });
        client.entered.notified().await;

        let err = handle
            .dispatch(SessionEvent::AnswerSubmitted("AI".into()))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Busy);

        client.release.notify_one();
        let transition = in_flight.await.unwrap().unwrap();
        assert!(matches!(transition, Transition::QuestionsReady { .. }));
        assert_eq!(handle.status().await.phase, Phase::Questioning);
    }
}
