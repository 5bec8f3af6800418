//! Wire types for the hosted responses API.

use serde::{Deserialize, Serialize};

use crate::core::message::{Message, Role};

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct InputItem {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub role: Role,
    pub content: String,
}

impl InputItem {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            kind: "message",
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for InputItem {
    fn from(message: &Message) -> Self {
        Self::new(message.role, message.text())
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    pub stream: bool,
}

/// A remote MCP server exposed to the model as a tool.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub server_label: String,
    pub server_url: String,
    pub headers: ToolHeaders,
    pub require_approval: &'static str,
}

#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct ToolHeaders {
    #[serde(rename = "Authorization")]
    pub authorization: String,
}

impl std::fmt::Debug for ToolHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHeaders")
            .field("authorization", &"<redacted>")
            .finish()
    }
}

/// One `data:` payload of a streaming response.
#[derive(Deserialize, Debug)]
pub struct StreamEventPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub delta: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ResponseObject {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Deserialize, Debug)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<OutputContent>,
}

#[derive(Deserialize, Debug)]
pub struct OutputContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ResponseObject {
    /// Concatenated `output_text` parts of every message output item.
    ///
    /// Tool items (`mcp_list_tools`, `mcp_call`, ...) carry no text for the
    /// transcript and are skipped.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}
