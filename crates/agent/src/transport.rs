// Transport to the chat completion endpoint

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::message::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use std::time::Duration;

/// Sends one chat completion request and returns the decoded response.
///
/// Implementations report network failures, non-2xx statuses and malformed
/// payloads as errors; the agent never retries those.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// HTTP transport for OpenAI-compatible `/chat/completions` endpoints
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with its own HTTP client
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| {
                AgentError::InvalidConfig(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self::with_client(client, config))
    }

    /// Create a transport around an existing client
    pub fn with_client(client: reqwest::Client, config: &AgentConfig) -> Self {
        Self {
            client,
            url: config.completions_url(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut builder = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| AgentError::Decode(e.to_string()))?;
        if parsed.choices.is_empty() {
            return Err(AgentError::Decode("response contains no choices".into()));
        }
        Ok(parsed)
    }
}
