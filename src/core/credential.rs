//! Ambient credentials for endpoints that accept token auth instead of keys.

use async_trait::async_trait;

use crate::core::error::ChatError;

pub const AD_TOKEN_ENV: &str = "AZURE_OPENAI_AD_TOKEN";

/// Produces a bearer token for each request.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<String, ChatError>;
}

/// Reads the token from an environment variable at request time, so a
/// sidecar or login helper can refresh it without restarting the process.
#[derive(Debug, Clone)]
pub struct EnvironmentCredential {
    variable: String,
}

impl EnvironmentCredential {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Default for EnvironmentCredential {
    fn default() -> Self {
        Self::new(AD_TOKEN_ENV)
    }
}

#[async_trait]
impl TokenCredential for EnvironmentCredential {
    async fn token(&self) -> Result<String, ChatError> {
        match std::env::var(&self.variable) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(ChatError::Credential(format!(
                "{} is not set",
                self.variable
            ))),
        }
    }
}
