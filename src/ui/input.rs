//! Slash-command parsing for the chat prompt.

use crate::core::suggestions::MAX_SUGGESTIONS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Nothing to do (blank line).
    Ignore,
    ProcessAsMessage(String),
    /// Zero-based index into the current suggestions.
    UseSuggestion(usize),
    Stop,
    Reset,
    Help,
    Quit,
}

pub const HELP_LINES: &[&str] = &[
    "/1 /2 /3   Send the numbered suggestion",
    "/stop      Stop the reply in progress",
    "/reset     Start a new conversation",
    "/help      Show this help",
    "/quit      Leave todochat",
];

pub fn process_input(input: &str) -> InputCommand {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return InputCommand::Ignore;
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return InputCommand::ProcessAsMessage(trimmed.to_string());
    };

    match command {
        "stop" => InputCommand::Stop,
        "reset" | "new" => InputCommand::Reset,
        "help" | "?" => InputCommand::Help,
        "quit" | "exit" => InputCommand::Quit,
        _ => match command.parse::<usize>() {
            Ok(number) if (1..=MAX_SUGGESTIONS).contains(&number) => {
                InputCommand::UseSuggestion(number - 1)
            }
            // Unknown commands go to the model as typed.
            _ => InputCommand::ProcessAsMessage(trimmed.to_string()),
        },
    }
}
