//! Session orchestration — the phase state machine that sequences question
//! generation, answer collection, final analysis, and follow-ups.

pub mod event;
pub mod orchestrator;
pub mod state;
pub mod status;
pub mod transcript;

pub use event::{QuestionSource, SessionEvent, Transition};
pub use orchestrator::{SessionHandle, SessionOrchestrator};
pub use state::{MAX_FOLLOW_UPS, Phase, SessionState};
pub use status::SessionStatus;
pub use transcript::{export_transcript, save_transcript};
