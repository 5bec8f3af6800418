//! Environment-variable layer applied on top of the config file.

use crate::core::config::data::{non_blank, Config};

pub const OPENAI_CONNECTION_STRING: &str = "OPENAI_CONNECTION_STRING";
pub const OPENAI_ENDPOINT: &str = "OPENAI_ENDPOINT";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_DEPLOYMENT_NAME: &str = "OPENAI_DEPLOYMENT_NAME";
pub const MCP_SERVER_URL: &str = "MCP_SERVER_URL";
pub const MCP_BEARER_TOKEN: &str = "MCP_BEARER_TOKEN";
pub const MCP_SERVER_LABEL: &str = "MCP_SERVER_LABEL";

impl Config {
    /// Overwrite file values with non-blank values from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let layer = |target: &mut Option<String>, key: &str| {
            if let Some(value) = lookup(key) {
                if let Some(value) = non_blank(Some(value.as_str())) {
                    *target = Some(value.to_string());
                }
            }
        };

        layer(&mut self.model.connection_string, OPENAI_CONNECTION_STRING);
        layer(&mut self.model.endpoint, OPENAI_ENDPOINT);
        layer(&mut self.model.api_key, OPENAI_API_KEY);
        layer(&mut self.model.deployment, OPENAI_DEPLOYMENT_NAME);
        layer(&mut self.mcp.server_url, MCP_SERVER_URL);
        layer(&mut self.mcp.bearer_token, MCP_BEARER_TOKEN);
        layer(&mut self.mcp.server_label, MCP_SERVER_LABEL);
    }

    pub fn apply_process_env(&mut self) {
        self.apply_env_overrides(|key| std::env::var(key).ok());
    }
}
