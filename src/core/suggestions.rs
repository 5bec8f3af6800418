//! Follow-up question suggestions offered after each assistant turn.

use crate::api::{InputItem, ResponsesRequest};
use crate::core::message::{Message, Role};

pub const MAX_SUGGESTIONS: usize = 3;

/// How many recent user/assistant messages the suggestion request sees.
pub const SUGGESTION_CONTEXT_MESSAGES: usize = 5;

pub const SUGGESTION_INSTRUCTION: &str = "Suggest up to 3 follow-up questions that I could ask you next. \
Each suggestion must be a complete sentence of at most 6 words, phrased as something I, the user, would ask you, \
and must stay relevant to what you help with. \
Write one suggestion per line with no numbering, bullets or other text. \
If there is nothing useful to suggest, reply with nothing.";

/// Leading system messages followed by the most recent non-empty dialogue
/// messages, in their original order.
pub fn reduce_context(messages: &[Message]) -> Vec<Message> {
    let leading_system = messages
        .iter()
        .take_while(|message| message.role.is_system())
        .count();

    let recent: Vec<&Message> = messages[leading_system..]
        .iter()
        .filter(|message| message.role.is_dialogue() && !message.text().trim().is_empty())
        .collect();
    let skip = recent.len().saturating_sub(SUGGESTION_CONTEXT_MESSAGES);

    messages[..leading_system]
        .iter()
        .chain(recent.into_iter().skip(skip))
        .cloned()
        .collect()
}

/// The reduced context plus the fixed instruction, as protocol items.
pub fn build_suggestion_request(model: &str, messages: &[Message]) -> ResponsesRequest {
    let mut input: Vec<InputItem> = reduce_context(messages).iter().map(InputItem::from).collect();
    input.push(InputItem::new(Role::User, SUGGESTION_INSTRUCTION));

    ResponsesRequest {
        model: model.to_string(),
        input,
        tools: Vec::new(),
        stream: false,
    }
}

/// One suggestion per non-blank line, at most [`MAX_SUGGESTIONS`].
pub fn parse_suggestions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}
