use crate::core::config::data::{non_blank, Config};

fn describe(value: Option<&str>) -> &str {
    non_blank(value).unwrap_or("(unset)")
}

fn describe_secret(value: Option<&str>) -> &'static str {
    if non_blank(value).is_some() {
        "(set)"
    } else {
        "(unset)"
    }
}

impl Config {
    /// Effective settings with secrets masked.
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            "model:".to_string(),
            format!(
                "  connection-string: {}",
                describe_secret(self.model.connection_string.as_deref())
            ),
            format!("  endpoint: {}", describe(self.model.endpoint.as_deref())),
            format!("  api-key: {}", describe_secret(self.model.api_key.as_deref())),
            format!("  deployment: {}", describe(self.model.deployment.as_deref())),
            "mcp:".to_string(),
            format!("  server-url: {}", describe(self.mcp.server_url.as_deref())),
            format!(
                "  bearer-token: {}",
                describe_secret(self.mcp.bearer_token.as_deref())
            ),
            format!("  server-label: {}", self.server_label()),
            format!(
                "  require-approval: {}",
                describe(self.mcp.require_approval.as_deref())
            ),
            "chat:".to_string(),
            format!(
                "  system-prompt: {}",
                if non_blank(self.chat.system_prompt.as_deref()).is_some() {
                    "custom"
                } else {
                    "default"
                }
            ),
        ]
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.summary_lines() {
            println!("  {line}");
        }
    }
}
