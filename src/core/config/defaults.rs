use crate::core::config::data::{non_blank, Config};

pub const DEFAULT_DEPLOYMENT: &str = "gpt-5-mini";
pub const DEFAULT_SERVER_LABEL: &str = "todo-list";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant that helps people manage their to-do list. \
Use the to-do list tools to look up, add, complete and remove items instead of guessing. \
Keep answers short and list items one per line.";

impl Config {
    pub fn system_prompt(&self) -> &str {
        non_blank(self.chat.system_prompt.as_deref()).unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn server_label(&self) -> &str {
        non_blank(self.mcp.server_label.as_deref()).unwrap_or(DEFAULT_SERVER_LABEL)
    }
}
