//! Prompt builders for question generation, final analysis, and follow-ups.
//!
//! Field order is fixed: task, company info, answers or follow-up text,
//! history, instructions.

use super::model::{Answer, Profile, Task, Turn};

/// Render the conversation as `role: content` lines.
pub fn format_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render answers as pretty JSON (`question`, `answer`, `type`).
pub fn format_answers(answers: &[Answer]) -> String {
    serde_json::to_string_pretty(answers).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to serialize answers for prompt");
        answers
            .iter()
            .map(|a| format!("{}: {}", a.question, a.answer))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

/// Prompt asking the backend for up to five typed questions as a JSON array.
pub fn question_generation_prompt(task: Task, profile: &Profile) -> String {
    format!(
        "Task: {task}\n\
         Company Info: {company}\n\n\
         Generate up to 5 short questions (max 15 words each) about the company for the task, including:\n\
         - At least 1 MCQ with 4 options.\n\
         - At least 1 Radio question with 3 options.\n\
         - At least 1 Input-type question (short text input).\n\
         - Focus on company details relevant to the task.\n\
         - Ensure questions elicit detailed insights for a comprehensive {task} analysis.\n\n\
         Output as JSON array:\n\
         [\n  \
           {{\n    \
             \"type\": \"MCQ\" or \"Radio\" or \"Input\",\n    \
             \"question\": \"Question text\",\n    \
             \"options\": [\"Option1\", \"Option2\", ...] (for MCQ and Radio only)\n  \
           }}\n\
         ]\n\n\
         Respond with ONLY the JSON array.",
        task = task.name(),
        company = profile.summary(),
    )
}

/// Prompt for the final analysis after all questions are answered.
pub fn final_analysis_prompt(
    task: Task,
    profile: &Profile,
    answers: &[Answer],
    history: &[Turn],
) -> String {
    format!(
        "{persona}\n\n\
         Task: {task}\n\
         Company Info: {company}\n\
         User Answers: {answers}\n\
         History: {history}\n\n\
         Generate a concise final response for the task based on the company information \
         and user answers to questions. Provide actionable insights relevant to the task, \
         covering {focus}.",
        persona = task.persona(),
        task = task.name(),
        company = profile.summary(),
        answers = format_answers(answers),
        history = format_history(history),
        focus = task.focus_areas().join(", "),
    )
}

/// Prompt for one follow-up exchange.
pub fn follow_up_prompt(task: Task, profile: &Profile, user_input: &str, history: &[Turn]) -> String {
    format!(
        "{persona}\n\n\
         Task: {task}\n\
         Company Info: {company}\n\
         User Follow-Up: {user_input}\n\
         History: {history}\n\n\
         Generate a concise response to the follow-up question, ensuring relevance to the \
         task and company context.",
        persona = task.persona(),
        task = task.name(),
        company = profile.summary(),
        history = format_history(history),
    )
}
