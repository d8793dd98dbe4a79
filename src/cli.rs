//! Command parsing for the interactive terminal session.

use std::path::PathBuf;

use crate::error::SessionError;
use crate::interview::model::Task;

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Status,
    /// Clear history, keep the profile.
    Reset,
    /// Pick a different task.
    ChangeTask,
    /// Re-enter the company profile.
    ChangeProfile,
    Export(PathBuf),
    Rate { turn_index: usize, rating: u8 },
    /// A slash command with bad arguments; carries a usage hint.
    Invalid(String),
    /// Anything that is not a command.
    Input(String),
}

/// Parses user input into `Command`s.
pub struct CommandParser;

impl CommandParser {
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        if !trimmed.starts_with('/') {
            return Command::Input(trimmed.to_string());
        }

        let mut parts = trimmed.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        match command.as_str() {
            "/quit" | "/exit" => Command::Quit,
            "/help" | "/?" => Command::Help,
            "/status" => Command::Status,
            "/reset" | "/clear" => Command::Reset,
            "/task" => Command::ChangeTask,
            "/profile" => Command::ChangeProfile,
            "/export" => Command::Export(PathBuf::from(
                args.first().copied().unwrap_or("chat_history.json"),
            )),
            "/rate" => match args.as_slice() {
                [index, rating] => match (index.parse(), rating.parse()) {
                    (Ok(turn_index), Ok(rating)) => Command::Rate { turn_index, rating },
                    _ => Command::Invalid("usage: /rate <turn> <1-5>".into()),
                },
                _ => Command::Invalid("usage: /rate <turn> <1-5>".into()),
            },
            other => Command::Invalid(format!("unknown command {other}, try /help")),
        }
    }
}

/// Help text for the REPL.
pub const HELP: &str = "\
Commands:
  /status              show progress and call count
  /rate <turn> <1-5>   rate an analysis or follow-up reply
  /export [path]       save the conversation as JSON
  /task                choose another task
  /profile             enter a new company profile
  /reset               clear history (keeps the profile)
  /quit                exit";

/// Map a numbered pick (`"2"`) to its option; anything else passes through.
pub fn resolve_choice(input: &str, options: &[String]) -> String {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => options[n - 1].clone(),
        _ => input.trim().to_string(),
    }
}

/// Parse a task pick by menu number or by name.
pub fn parse_task_choice(input: &str) -> Result<Task, SessionError> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=Task::ALL.len()).contains(&n) => Ok(Task::ALL[n - 1]),
        _ => input.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_input() {
        assert_eq!(
            CommandParser::parse("  What about pricing?  "),
            Command::Input("What about pricing?".into())
        );
    }

    #[test]
    fn control_commands() {
        assert_eq!(CommandParser::parse("/quit"), Command::Quit);
        assert_eq!(CommandParser::parse("/EXIT"), Command::Quit);
        assert_eq!(CommandParser::parse("/clear"), Command::Reset);
        assert_eq!(CommandParser::parse("/task"), Command::ChangeTask);
        assert_eq!(CommandParser::parse("/profile"), Command::ChangeProfile);
        assert_eq!(CommandParser::parse("/?"), Command::Help);
    }

    #[test]
    fn export_defaults_path() {
        assert_eq!(
            CommandParser::parse("/export"),
            Command::Export(PathBuf::from("chat_history.json"))
        );
        assert_eq!(
            CommandParser::parse("/export out/acme.json"),
            Command::Export(PathBuf::from("out/acme.json"))
        );
    }

    #[test]
    fn rate_parses_arguments() {
        assert_eq!(
            CommandParser::parse("/rate 6 4"),
            Command::Rate {
                turn_index: 6,
                rating: 4
            }
        );
        assert!(matches!(CommandParser::parse("/rate 6"), Command::Invalid(_)));
        assert!(matches!(CommandParser::parse("/rate x 4"), Command::Invalid(_)));
        assert!(matches!(CommandParser::parse("/dance"), Command::Invalid(_)));
    }

    #[test]
    fn numbered_choices_resolve() {
        let options = vec!["Yes".to_string(), "No".to_string(), "Unsure".to_string()];
        assert_eq!(resolve_choice("2", &options), "No");
        assert_eq!(resolve_choice("Unsure", &options), "Unsure");
        assert_eq!(resolve_choice("9", &options), "9");
        assert_eq!(resolve_choice("", &options), "");
    }

    #[test]
    fn task_choice_by_number_or_name() {
        assert_eq!(parse_task_choice("1").unwrap(), Task::StrategicPlanning);
        assert_eq!(
            parse_task_choice("stakeholder engagement strategy").unwrap(),
            Task::StakeholderEngagementStrategy
        );
        assert!(parse_task_choice("7").is_err());
    }
}
