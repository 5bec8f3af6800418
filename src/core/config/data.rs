use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for reaching the model API. Any of the three shapes may be used:
/// a connection string, an endpoint (with or without key), or a bare key.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    /// Semicolon-delimited `Endpoint=...;Key=...;Deployment=...` pairs
    pub connection_string: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Model deployment name; falls back to `gpt-5-mini`
    pub deployment: Option<String>,
}

/// The remote MCP server handed to the model as a tool.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct McpSettings {
    /// Base URL of the server; `/mcp` is appended when missing
    pub server_url: Option<String>,
    pub bearer_token: Option<String>,
    pub server_label: Option<String>,
    /// Only `never` is supported
    pub require_approval: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub mcp: McpSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

/// Treat blank strings the same as unset values.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
