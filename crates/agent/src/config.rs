// Agent configuration

use crate::error::{AgentError, Result};
use serde_json::{Map, Value};
use std::time::Duration;

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default number of attempts per completion call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-attempt request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Request fields owned by the agent that generation parameters may not override
const RESERVED_PARAMS: [&str; 3] = ["model", "messages", "stream"];

/// Immutable configuration for one completion agent.
///
/// Built through [`AgentConfig::builder`], which enforces that both prompt
/// templates are present.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Name used in log output
    pub agent_name: String,

    /// System prompt template
    pub system_prompt: String,

    /// Human (user) prompt template
    pub human_prompt: String,

    /// Target model identifier
    pub model_name: String,

    /// Endpoint base URL, without the `/chat/completions` suffix
    pub base_url: String,

    /// Bearer credential sent with every request
    pub api_key: String,

    /// Extra request fields (temperature, top_p, ...) passed through verbatim
    pub generation: Map<String, Value>,

    /// Maximum number of attempts per call (at least 1)
    pub max_retries: u32,

    /// Timeout applied to each attempt
    pub timeout: Duration,
}

impl AgentConfig {
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Full URL of the chat completion endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Builder for [`AgentConfig`]
#[derive(Debug, Clone)]
pub struct AgentConfigBuilder {
    agent_name: String,
    system_prompt: Option<String>,
    human_prompt: Option<String>,
    model_name: String,
    base_url: String,
    api_key: String,
    generation: Map<String, Value>,
    max_retries: u32,
    timeout: Duration,
}

impl Default for AgentConfigBuilder {
    fn default() -> Self {
        Self {
            agent_name: "CompletionAgent".to_string(),
            system_prompt: None,
            human_prompt: None,
            model_name: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            generation: Map::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AgentConfigBuilder {
    pub fn agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    pub fn system_prompt(mut self, template: impl Into<String>) -> Self {
        self.system_prompt = Some(template.into());
        self
    }

    pub fn human_prompt(mut self, template: impl Into<String>) -> Self {
        self.human_prompt = Some(template.into());
        self
    }

    pub fn model_name(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    pub fn temperature(self, temperature: f64) -> Self {
        self.param("temperature", temperature)
    }

    /// Add a single generation parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.generation.insert(key.into(), value.into());
        self
    }

    /// Merge a map of generation parameters, overriding existing keys
    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.generation.extend(params);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<AgentConfig> {
        let system_prompt = self
            .system_prompt
            .ok_or_else(|| AgentError::InvalidConfig("system_prompt is required".into()))?;
        let human_prompt = self
            .human_prompt
            .ok_or_else(|| AgentError::InvalidConfig("human_prompt is required".into()))?;

        if self.max_retries == 0 {
            return Err(AgentError::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(AgentError::InvalidConfig("timeout must be non-zero".into()));
        }
        if let Some(key) = RESERVED_PARAMS
            .iter()
            .find(|k| self.generation.contains_key(**k))
        {
            return Err(AgentError::InvalidConfig(format!(
                "generation parameter '{}' is set by the agent and cannot be overridden",
                key
            )));
        }

        Ok(AgentConfig {
            agent_name: self.agent_name,
            system_prompt,
            human_prompt,
            model_name: self.model_name,
            base_url: self.base_url,
            api_key: self.api_key,
            generation: self.generation,
            max_retries: self.max_retries,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_templates_rejected() {
        let err = AgentConfig::builder().human_prompt("{x}").build().unwrap_err();
        assert!(err.to_string().contains("system_prompt"));

        let err = AgentConfig::builder().system_prompt("sys").build().unwrap_err();
        assert!(err.to_string().contains("human_prompt"));
    }

    #[test]
    fn test_defaults() {
        let config = AgentConfig::builder()
            .system_prompt("sys")
            .human_prompt("user")
            .build()
            .unwrap();
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.completions_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_zero_retries_rejected() {
        let result = AgentConfig::builder()
            .system_prompt("sys")
            .human_prompt("user")
            .max_retries(0)
            .build();
        assert!(matches!(result, Err(AgentError::InvalidConfig(_))));
    }

    #[test]
    fn test_reserved_params_rejected() {
        let result = AgentConfig::builder()
            .system_prompt("sys")
            .human_prompt("user")
            .param("model", "other")
            .build();
        assert!(matches!(result, Err(AgentError::InvalidConfig(_))));
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let config = AgentConfig::builder()
            .system_prompt("sys")
            .human_prompt("user")
            .base_url("http://localhost:8004/v1/")
            .temperature(0.2)
            .build()
            .unwrap();
        assert_eq!(config.completions_url(), "http://localhost:8004/v1/chat/completions");
        assert_eq!(config.generation["temperature"], serde_json::json!(0.2));
    }
}
