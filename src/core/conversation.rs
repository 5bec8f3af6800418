use crate::api::InputItem;
use crate::core::message::Message;

/// Transcript of one chat session plus the matching protocol items.
///
/// The first message is always the fixed system prompt. `messages` and
/// `items` only ever grow together through [`Conversation::push`], so they
/// stay in 1:1 correspondence.
#[derive(Debug, Clone)]
pub struct Conversation {
    system_prompt: String,
    messages: Vec<Message>,
    items: Vec<InputItem>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let mut conversation = Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            items: Vec::new(),
        };
        conversation.reset();
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn items(&self) -> &[InputItem] {
        &self.items
    }

    pub fn has_dialogue(&self) -> bool {
        self.messages.iter().any(|message| message.role.is_dialogue())
    }

    pub fn push(&mut self, message: Message) {
        self.items.push(InputItem::from(&message));
        self.messages.push(message);
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.items.clear();
        let system = Message::system(self.system_prompt.clone());
        self.push(system);
    }
}
