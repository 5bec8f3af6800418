use std::fmt;

use tracing::debug;

use crate::api::{ToolDefinition, ToolHeaders};
use crate::core::config::data::{non_blank, Config};
use crate::core::error::ConfigurationError;
use crate::mcp::{MCP_ENDPOINT_PATH, MCP_TOOL_TYPE};
use crate::utils::url::append_path_once;

/// Whether the model must ask before calling a tool on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalPolicy {
    /// Calls run without confirmation.
    #[default]
    Never,
}

impl ApprovalPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalPolicy::Never => "never",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ConfigurationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(ApprovalPolicy::Never),
            other => Err(ConfigurationError::invalid(
                "mcp.require_approval",
                format!("'{other}' is not supported (tool calls cannot be confirmed interactively; use 'never')"),
            )),
        }
    }
}

/// The MCP server registered as a model tool. Built once at startup and
/// shared read-only by every session; the token is fixed for the process
/// lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct McpToolRegistration {
    server_label: String,
    server_url: String,
    bearer_token: String,
    approval: ApprovalPolicy,
}

impl McpToolRegistration {
    pub fn new(
        server_label: impl Into<String>,
        server_url: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Self {
        Self {
            server_label: server_label.into(),
            server_url: server_url.into(),
            bearer_token: bearer_token.into(),
            approval: ApprovalPolicy::Never,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigurationError> {
        let settings = &config.mcp;
        let base_url = non_blank(settings.server_url.as_deref())
            .ok_or_else(|| ConfigurationError::missing("mcp.server_url"))?;
        let bearer_token = non_blank(settings.bearer_token.as_deref())
            .ok_or_else(|| ConfigurationError::missing("mcp.bearer_token"))?;
        let approval = match non_blank(settings.require_approval.as_deref()) {
            Some(value) => ApprovalPolicy::parse(value)?,
            None => ApprovalPolicy::default(),
        };

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigurationError::invalid(
                "mcp.server_url",
                "expected an http or https URL",
            ));
        }

        let registration = Self {
            server_label: config.server_label().to_string(),
            server_url: append_path_once(base_url, MCP_ENDPOINT_PATH),
            bearer_token: bearer_token.to_string(),
            approval,
        };
        debug!(
            label = %registration.server_label,
            url = %registration.server_url,
            "registered MCP tool server"
        );
        Ok(registration)
    }

    pub fn server_label(&self) -> &str {
        &self.server_label
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            kind: MCP_TOOL_TYPE,
            server_label: self.server_label.clone(),
            server_url: self.server_url.clone(),
            headers: ToolHeaders {
                authorization: format!("Bearer {}", self.bearer_token),
            },
            require_approval: self.approval.as_str(),
        }
    }
}

impl fmt::Debug for McpToolRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpToolRegistration")
            .field("server_label", &self.server_label)
            .field("server_url", &self.server_url)
            .field("bearer_token", &"<redacted>")
            .field("approval", &self.approval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::data::McpSettings;

    fn config_with(url: Option<&str>, token: Option<&str>) -> Config {
        Config {
            mcp: McpSettings {
                server_url: url.map(str::to_string),
                bearer_token: token.map(str::to_string),
                ..McpSettings::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn builds_descriptor_from_config() {
        let config = config_with(Some("https://todo.example.com/"), Some("jwt-123"));
        let registration = McpToolRegistration::from_config(&config).unwrap();

        assert_eq!(registration.server_url(), "https://todo.example.com/mcp");
        assert_eq!(registration.server_label(), "todo-list");

        let json = serde_json::to_value(registration.tool_definition()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "mcp",
                "server_label": "todo-list",
                "server_url": "https://todo.example.com/mcp",
                "headers": { "Authorization": "Bearer jwt-123" },
                "require_approval": "never"
            })
        );
    }

    #[test]
    fn existing_mcp_path_is_kept() {
        let config = config_with(Some("https://todo.example.com/mcp"), Some("jwt"));
        let registration = McpToolRegistration::from_config(&config).unwrap();
        assert_eq!(registration.server_url(), "https://todo.example.com/mcp");
    }

    #[test]
    fn missing_url_or_token_is_a_configuration_error() {
        let err = McpToolRegistration::from_config(&config_with(None, Some("jwt"))).unwrap_err();
        assert_eq!(err, ConfigurationError::missing("mcp.server_url"));

        let err = McpToolRegistration::from_config(&config_with(
            Some("https://todo.example.com"),
            Some("  "),
        ))
        .unwrap_err();
        assert_eq!(err, ConfigurationError::missing("mcp.bearer_token"));
    }

    #[test]
    fn non_http_url_is_rejected() {
        let err = McpToolRegistration::from_config(&config_with(Some("todo.example.com"), Some("jwt")))
            .unwrap_err();
        assert!(err.to_string().contains("mcp.server_url"));
    }

    #[test]
    fn only_never_approval_is_accepted() {
        assert_eq!(ApprovalPolicy::parse(" Never "), Ok(ApprovalPolicy::Never));

        let mut config = config_with(Some("https://todo.example.com"), Some("jwt"));
        config.mcp.require_approval = Some("always".into());
        let err = McpToolRegistration::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("'always' is not supported"));
    }

    #[test]
    fn debug_output_redacts_token() {
        let registration = McpToolRegistration::new("todo-list", "https://t/mcp", "jwt-secret");
        assert!(!format!("{registration:?}").contains("jwt-secret"));
    }
}
