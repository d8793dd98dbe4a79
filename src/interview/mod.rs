//! Interview domain — question generation, caching, and the task agent.
//!
//! A session asks a short, typed question set for a (task, profile) pair,
//! then hands the answers to a per-task agent for a final analysis and a
//! bounded number of follow-ups. Backend failures never escape this module
//! as errors; they surface as `Outcome` variants.

pub mod agent;
pub mod cache;
pub mod generator;
pub mod model;
pub mod outcome;
pub mod prompts;

pub use agent::{FOLLOW_UP_APOLOGY, TaskAgent};
pub use cache::{QuestionCache, cache_key};
pub use generator::{QuestionSetGenerator, fallback_question_set};
pub use model::{Answer, Profile, Question, QuestionKind, QuestionSet, Role, Task, Turn};
pub use outcome::{FallbackReason, Outcome};
