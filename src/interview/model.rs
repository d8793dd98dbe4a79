//! Interview data model: profiles, tasks, questions, answers, and turns.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Upper bound on the number of questions in any set.
pub const MAX_QUESTIONS: usize = 5;

/// MCQ and Radio questions offer at least this many options.
pub const MIN_CHOICE_OPTIONS: usize = 2;

/// Company profile used as generation and cache context.
///
/// Deserialization projects exactly these four fields (unknown keys are
/// dropped, missing ones default to empty), so two profiles that differ only
/// in key order or extra keys compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub description: String,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        industry: impl Into<String>,
        size: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            industry: industry.into(),
            size: size.into(),
            description: description.into(),
        }
    }

    /// A profile is complete once it has a name and an industry.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.industry.trim().is_empty()
    }

    /// The four normalized fields in fixed order.
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("name", self.name.as_str()),
            ("industry", self.industry.as_str()),
            ("size", self.size.as_str()),
            ("description", self.description.as_str()),
        ]
    }

    /// One-line `key: value` summary of the non-empty fields, for prompts.
    pub fn summary(&self) -> String {
        self.fields()
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Canonical serialization with sorted keys, used in cache keys.
    pub fn canonical_json(&self) -> String {
        let mut fields = self.fields();
        fields.sort_by_key(|(key, _)| *key);
        let body = fields
            .iter()
            .map(|(key, value)| {
                format!("\"{key}\":{}", serde_json::Value::from(*value))
            })
            .collect::<Vec<_>>()
            .join(",");
        format!("{{{body}}}")
    }
}

/// The fixed set of analysis tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Task {
    #[serde(rename = "Strategic Planning")]
    StrategicPlanning,
    #[serde(rename = "Organizational Assessment")]
    OrganizationalAssessment,
    #[serde(rename = "Operational Efficiency Analysis")]
    OperationalEfficiencyAnalysis,
    #[serde(rename = "Stakeholder Engagement Strategy")]
    StakeholderEngagementStrategy,
}

impl Task {
    pub const ALL: [Task; 4] = [
        Task::StrategicPlanning,
        Task::OrganizationalAssessment,
        Task::OperationalEfficiencyAnalysis,
        Task::StakeholderEngagementStrategy,
    ];

    /// Human-readable task name, also used in prompts and cache keys.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StrategicPlanning => "Strategic Planning",
            Self::OrganizationalAssessment => "Organizational Assessment",
            Self::OperationalEfficiencyAnalysis => "Operational Efficiency Analysis",
            Self::StakeholderEngagementStrategy => "Stakeholder Engagement Strategy",
        }
    }

    /// Persona the agent adopts for this task.
    pub fn persona(&self) -> &'static str {
        match self {
            Self::StrategicPlanning => {
                "You are a strategic planning consultant who turns company context into \
                 a clear direction, measurable goals, and a phased roadmap."
            }
            Self::OrganizationalAssessment => {
                "You are an organizational development consultant who evaluates structure, \
                 culture, capabilities, and leadership to find strengths and gaps."
            }
            Self::OperationalEfficiencyAnalysis => {
                "You are an operations analyst who finds bottlenecks, waste, and automation \
                 opportunities in how a company delivers its work."
            }
            Self::StakeholderEngagementStrategy => {
                "You are a stakeholder engagement strategist who maps stakeholders, their \
                 interests and influence, and designs communication plans for them."
            }
        }
    }

    /// Topics the analysis should cover.
    pub fn focus_areas(&self) -> &'static [&'static str] {
        match self {
            Self::StrategicPlanning => &[
                "vision and objectives",
                "market position and competition",
                "growth opportunities",
                "risks",
                "a prioritized action plan",
            ],
            Self::OrganizationalAssessment => &[
                "organizational structure",
                "culture and engagement",
                "skills and capability gaps",
                "leadership effectiveness",
                "recommended changes",
            ],
            Self::OperationalEfficiencyAnalysis => &[
                "core processes",
                "bottlenecks and waste",
                "technology and automation",
                "cost drivers",
                "quick wins and longer-term improvements",
            ],
            Self::StakeholderEngagementStrategy => &[
                "key stakeholder groups",
                "interests and influence",
                "current engagement gaps",
                "communication channels",
                "an engagement plan",
            ],
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Task {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Task::ALL
            .into_iter()
            .find(|task| task.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SessionError::UnknownTask(wanted.to_string()))
    }
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    /// Multiple choice, pick from a list.
    #[serde(rename = "MCQ")]
    Mcq,
    /// Single choice from a short list.
    #[serde(rename = "Radio")]
    Radio,
    /// Free text.
    #[serde(rename = "Input")]
    Input,
}

impl QuestionKind {
    /// Whether questions of this kind carry an option list.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Mcq | Self::Radio)
    }

    /// Parse the wire label (`"MCQ"`, `"Radio"`, `"Input"`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "MCQ" => Some(Self::Mcq),
            "Radio" => Some(Self::Radio),
            "Input" => Some(Self::Input),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mcq => "MCQ",
            Self::Radio => "Radio",
            Self::Input => "Input",
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single interview question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "type")]
    kind: QuestionKind,
    #[serde(rename = "question")]
    text: String,
    #[serde(default)]
    options: Vec<String>,
}

impl Question {
    pub fn mcq(text: impl Into<String>, options: Vec<String>) -> Self {
        Self::with_options(QuestionKind::Mcq, text, options)
    }

    pub fn radio(text: impl Into<String>, options: Vec<String>) -> Self {
        Self::with_options(QuestionKind::Radio, text, options)
    }

    pub fn input(text: impl Into<String>) -> Self {
        Self {
            kind: QuestionKind::Input,
            text: text.into(),
            options: Vec::new(),
        }
    }

    fn with_options(kind: QuestionKind, text: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            options,
        }
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}

/// Ordered, bounded list of questions. Cheap to clone; clones share storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuestionSet {
    questions: Arc<Vec<Question>>,
}

impl QuestionSet {
    /// Build a set, keeping at most `MAX_QUESTIONS` in their original order.
    pub fn new(mut questions: Vec<Question>) -> Self {
        questions.truncate(MAX_QUESTIONS);
        Self {
            questions: Arc::new(questions),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Whether the set has at least one MCQ, one Radio, and one Input question.
    pub fn covers_required_kinds(&self) -> bool {
        [QuestionKind::Mcq, QuestionKind::Radio, QuestionKind::Input]
            .iter()
            .all(|kind| self.questions.iter().any(|q| q.kind == *kind))
    }

    /// Whether two sets share the same storage.
    pub fn ptr_eq(&self, other: &QuestionSet) -> bool {
        Arc::ptr_eq(&self.questions, &other.questions)
    }
}

/// A recorded answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assistant => write!(f, "assistant"),
            Self::User => write!(f, "user"),
        }
    }
}

/// One message in the visible conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Set on the final analysis and on follow-up replies; only these are rateable.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_final_or_follow_up: bool,
}

impl Turn {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            is_final_or_follow_up: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            is_final_or_follow_up: false,
        }
    }

    /// An assistant turn carrying the final analysis or a follow-up reply.
    pub fn response(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            is_final_or_follow_up: true,
        }
    }

    pub fn is_rateable(&self) -> bool {
        self.role == Role::Assistant && self.is_final_or_follow_up
    }
}
