//! Builds the model API client from layered configuration.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::api::{ResponseObject, ResponsesRequest};
use crate::core::chat_stream::{
    describe_api_error, sse_event_stream, ResponseEventStream, ResponsesApi,
};
use crate::core::config::data::{non_blank, ModelSettings};
use crate::core::config::defaults::DEFAULT_DEPLOYMENT;
use crate::core::credential::TokenCredential;
use crate::core::error::{ChatError, ConfigurationError};
use crate::utils::url::{append_path_once, construct_api_url, normalize_base_url};

pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://api.openai.com/v1";

/// Hosts that serve the responses API under `/openai/v1` and accept token
/// credentials as well as keys.
const MANAGED_HOST_SUFFIXES: &[&str] = &[
    ".openai.azure.com",
    ".cognitiveservices.azure.com",
    ".services.ai.azure.com",
];
const MANAGED_API_PATH: &str = "openai/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    /// Managed-cloud host: `api-key` header for keys, token auth allowed.
    pub managed: bool,
}

pub fn normalize_endpoint(raw: &str) -> Result<Endpoint, ConfigurationError> {
    let trimmed = normalize_base_url(raw);
    let url = Url::parse(&trimmed).map_err(|err| ConfigurationError::invalid("model.endpoint", err))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigurationError::invalid(
            "model.endpoint",
            "expected an http or https URL",
        ));
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let managed = MANAGED_HOST_SUFFIXES
        .iter()
        .any(|suffix| host.ends_with(suffix));
    let base_url = if managed {
        append_path_once(&trimmed, MANAGED_API_PATH)
    } else {
        trimmed
    };

    Ok(Endpoint { base_url, managed })
}

/// Parsed `Endpoint=...;Key=...;Deployment=...` connection string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub endpoint: Option<String>,
    pub key: Option<String>,
    pub deployment: Option<String>,
}

pub fn parse_connection_string(raw: &str) -> Result<ConnectionString, ConfigurationError> {
    let mut parsed = ConnectionString::default();

    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((name, value)) = segment.split_once('=') else {
            return Err(ConfigurationError::invalid(
                "model.connection_string",
                format!("segment '{}' is not a key=value pair", segment_name(segment)),
            ));
        };
        let value = non_blank(Some(value)).map(str::to_string);
        match name.trim().to_ascii_lowercase().as_str() {
            "endpoint" => parsed.endpoint = value,
            "key" | "apikey" => parsed.key = value,
            "deployment" | "model" => parsed.deployment = value,
            other => debug!("ignoring connection string entry '{other}'"),
        }
    }

    Ok(parsed)
}

// Keep secrets out of error messages when a segment is malformed.
fn segment_name(segment: &str) -> String {
    segment.chars().take(12).collect::<String>() + "..."
}

#[derive(Clone)]
pub enum ClientAuth {
    /// Key sent as `api-key` (managed endpoints) or as a bearer token.
    ApiKey { key: String, header: KeyHeader },
    /// Token from an ambient credential, fetched per request.
    Credential(Arc<dyn TokenCredential>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHeader {
    ApiKey,
    Bearer,
}

impl fmt::Debug for ClientAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientAuth::ApiKey { header, .. } => f
                .debug_struct("ClientAuth::ApiKey")
                .field("key", &"<redacted>")
                .field("header", header)
                .finish(),
            ClientAuth::Credential(_) => f.write_str("ClientAuth::Credential"),
        }
    }
}

/// A responses API client bound to one deployment.
#[derive(Clone, Debug)]
pub struct ModelClient {
    http: reqwest::Client,
    base_url: String,
    auth: ClientAuth,
    deployment: String,
}

impl ModelClient {
    /// Resolve settings into a client.
    ///
    /// A connection string wins over the separate fields. Then: endpoint and
    /// key, endpoint with the ambient credential (managed endpoints only),
    /// and finally a bare key against the public API.
    pub fn from_settings(
        settings: &ModelSettings,
        credential: Option<Arc<dyn TokenCredential>>,
    ) -> Result<Self, ConfigurationError> {
        let mut endpoint = non_blank(settings.endpoint.as_deref()).map(str::to_string);
        let mut key = non_blank(settings.api_key.as_deref()).map(str::to_string);
        let mut deployment = non_blank(settings.deployment.as_deref()).map(str::to_string);

        if let Some(raw) = non_blank(settings.connection_string.as_deref()) {
            let parsed = parse_connection_string(raw)?;
            if parsed.endpoint.is_none() && parsed.key.is_none() {
                return Err(ConfigurationError::invalid(
                    "model.connection_string",
                    "needs an Endpoint or Key entry",
                ));
            }
            endpoint = parsed.endpoint;
            key = parsed.key;
            deployment = deployment.or(parsed.deployment);
        }

        let (base_url, auth) = match (endpoint, key) {
            (Some(endpoint), Some(key)) => {
                let endpoint = normalize_endpoint(&endpoint)?;
                let header = if endpoint.managed {
                    KeyHeader::ApiKey
                } else {
                    KeyHeader::Bearer
                };
                (endpoint.base_url, ClientAuth::ApiKey { key, header })
            }
            (Some(endpoint), None) => {
                let endpoint = normalize_endpoint(&endpoint)?;
                if !endpoint.managed {
                    return Err(ConfigurationError::new(format!(
                        "Endpoint {} needs an API key; token credentials are only used for managed endpoints",
                        endpoint.base_url
                    )));
                }
                let credential = credential.ok_or_else(|| {
                    ConfigurationError::new(format!(
                        "Endpoint {} has no API key and no ambient credential is available",
                        endpoint.base_url
                    ))
                })?;
                (endpoint.base_url, ClientAuth::Credential(credential))
            }
            (None, Some(key)) => (
                DEFAULT_PUBLIC_BASE_URL.to_string(),
                ClientAuth::ApiKey {
                    key,
                    header: KeyHeader::Bearer,
                },
            ),
            (None, None) => return Err(ConfigurationError::no_model_credentials()),
        };

        let deployment = deployment.unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string());
        debug!(%base_url, %deployment, "model client configured");

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            auth,
            deployment,
        })
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn auth(&self) -> &ClientAuth {
        &self.auth
    }

    async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ChatError> {
        match &self.auth {
            ClientAuth::ApiKey {
                key,
                header: KeyHeader::ApiKey,
            } => Ok(request.header("api-key", key)),
            ClientAuth::ApiKey {
                key,
                header: KeyHeader::Bearer,
            } => Ok(request.bearer_auth(key)),
            ClientAuth::Credential(credential) => {
                let token = credential.token().await?;
                Ok(request.bearer_auth(token))
            }
        }
    }

    async fn send(&self, request: &ResponsesRequest) -> Result<reqwest::Response, ChatError> {
        let url = construct_api_url(&self.base_url, "responses");
        let http_request = self.authorize(self.http.post(url)).await?;
        let response = http_request.json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, "responses request rejected");
            return Err(ChatError::Api(describe_api_error(Some(status), &body)));
        }

        Ok(response)
    }
}

#[async_trait]
impl ResponsesApi for ModelClient {
    async fn stream_response(
        &self,
        mut request: ResponsesRequest,
    ) -> Result<ResponseEventStream, ChatError> {
        request.stream = true;
        let response = self.send(&request).await?;
        Ok(sse_event_stream(response))
    }

    async fn create_response(&self, mut request: ResponsesRequest) -> Result<String, ChatError> {
        request.stream = false;
        let response = self.send(&request).await?;
        let body = response.text().await?;
        let parsed: ResponseObject =
            serde_json::from_str(&body).map_err(|err| ChatError::Decode(err.to_string()))?;
        Ok(parsed.output_text())
    }
}
