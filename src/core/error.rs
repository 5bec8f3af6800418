//! Error taxonomy shared by the client, tool registration and chat session.

use std::error::Error;
use std::fmt;

const QUICK_FIXES: &[&str] = &[
    "export OPENAI_API_KEY=sk-...                      # Use the public API",
    "export OPENAI_ENDPOINT=https://<name>.openai.azure.com  # Plus OPENAI_API_KEY or a token",
    "export MCP_SERVER_URL=https://<todo-server>        # MCP server base URL",
    "export MCP_BEARER_TOKEN=...                        # Token the MCP server accepts",
];

/// A required setting is missing or unusable. Raised while building the
/// process-wide services, never while a chat is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn missing(key: &str) -> Self {
        Self::new(format!("Missing required setting '{key}'"))
    }

    pub fn invalid(key: &str, reason: impl fmt::Display) -> Self {
        Self::new(format!("Invalid value for '{key}': {reason}"))
    }

    pub fn no_model_credentials() -> Self {
        Self::new(
            "No usable model API configuration: set a connection string, an endpoint with a key or credential, or an API key",
        )
    }

    pub fn quick_fixes(&self) -> &'static [&'static str] {
        QUICK_FIXES
    }

    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ConfigurationError {}

/// A request to the model API failed. Cancellation is not represented here;
/// a cancelled operation simply stops producing updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The HTTP request could not be sent or the body could not be read.
    Request(String),
    /// The API answered with an error status or an error event.
    Api(String),
    /// The API answered with something that could not be decoded.
    Decode(String),
    /// The ambient credential could not produce a token.
    Credential(String),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Request(message) => write!(f, "Request failed: {message}"),
            ChatError::Api(message) => write!(f, "{message}"),
            ChatError::Decode(message) => write!(f, "Unexpected response: {message}"),
            ChatError::Credential(message) => write!(f, "Credential unavailable: {message}"),
        }
    }
}

impl Error for ChatError {}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Request(err.to_string())
    }
}
