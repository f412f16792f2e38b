//! Configuration file support for the photogen services

use crate::error::Result;
use agent::{AgentConfig, DATA_INPUT};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables that override the configuration file
pub const ENV_LLM_BASE_URL: &str = "PHOTOGEN_LLM_BASE_URL";
pub const ENV_LLM_MODEL: &str = "PHOTOGEN_LLM_MODEL";
pub const ENV_LLM_API_KEY: &str = "PHOTOGEN_LLM_API_KEY";
pub const ENV_SD_BASE_URL: &str = "PHOTOGEN_SD_BASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub stable_diffusion: StableDiffusionConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

/// Chat completion endpoint used to refine prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    #[serde(default)]
    pub model_name: String,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Extra generation parameters (top_p, max_tokens, ...)
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// JSON file holding `{ "<key>": { "system_prompt": "..." } }`
    #[serde(default = "default_prompts_path")]
    pub path: PathBuf,

    #[serde(default = "default_prompts_key")]
    pub key: String,

    /// Human prompt template; must use `{data_input}`
    #[serde(default = "default_human_prompt")]
    pub human_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StableDiffusionConfig {
    #[serde(default = "default_sd_base_url")]
    pub base_url: String,

    /// Where txt2img results are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where img2img results are written and served from
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,

    #[serde(default = "default_sd_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_photo_port")]
    pub photo_port: u16,

    #[serde(default = "default_img2img_port")]
    pub img2img_port: u16,
}

// Defaults

fn default_agent_name() -> String {
    "Prompt Generator Agent".to_string()
}

fn default_llm_base_url() -> String {
    "http://localhost:8004/v1".to_string()
}

fn default_api_key() -> String {
    "api_key".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_retries() -> u32 {
    3
}

fn default_llm_timeout() -> u64 {
    150
}

fn default_prompts_path() -> PathBuf {
    PathBuf::from("prompts/system_prompts.json")
}

fn default_prompts_key() -> String {
    "agent_com".to_string()
}

fn default_human_prompt() -> String {
    format!("Here is the prompt:\n{{{}}}\n", DATA_INPUT)
}

fn default_sd_base_url() -> String {
    "http://localhost:7861".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_result_dir() -> PathBuf {
    PathBuf::from("result")
}

fn default_sd_timeout() -> u64 {
    300
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_photo_port() -> u16 {
    7020
}

fn default_img2img_port() -> u16 {
    7028
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            model_name: String::new(),
            base_url: default_llm_base_url(),
            api_key: default_api_key(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            timeout_secs: default_llm_timeout(),
            params: Map::new(),
        }
    }
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            path: default_prompts_path(),
            key: default_prompts_key(),
            human_prompt: default_human_prompt(),
        }
    }
}

impl Default for StableDiffusionConfig {
    fn default() -> Self {
        Self {
            base_url: default_sd_base_url(),
            output_dir: default_output_dir(),
            result_dir: default_result_dir(),
            timeout_secs: default_sd_timeout(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            photo_port: default_photo_port(),
            img2img_port: default_img2img_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load the file if given (defaults otherwise), then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment-style lookups
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_LLM_BASE_URL) {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup(ENV_LLM_MODEL) {
            self.llm.model_name = model;
        }
        if let Some(key) = lookup(ENV_LLM_API_KEY) {
            self.llm.api_key = key;
        }
        if let Some(url) = lookup(ENV_SD_BASE_URL) {
            self.stable_diffusion.base_url = url;
        }
    }

    /// Agent configuration for the prompt generator
    pub fn agent_config(&self, system_prompt: impl Into<String>) -> Result<AgentConfig> {
        let config = AgentConfig::builder()
            .agent_name(self.llm.agent_name.as_str())
            .system_prompt(system_prompt)
            .human_prompt(self.prompts.human_prompt.as_str())
            .model_name(self.llm.model_name.as_str())
            .base_url(self.llm.base_url.as_str())
            .api_key(self.llm.api_key.as_str())
            .temperature(self.llm.temperature)
            .params(self.llm.params.clone())
            .max_retries(self.llm.max_retries)
            .timeout(Duration::from_secs(self.llm.timeout_secs))
            .build()?;
        Ok(config)
    }

    pub fn sd_timeout(&self) -> Duration {
        Duration::from_secs(self.stable_diffusion.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.llm.max_retries, 3);
        assert_eq!(config.llm.timeout_secs, 150);
        assert_eq!(config.service.photo_port, 7020);
        assert_eq!(config.service.img2img_port, 7028);
        assert_eq!(config.prompts.human_prompt, "Here is the prompt:\n{data_input}\n");
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [llm]
            model_name = "qwen2.5"
            temperature = 0.3

            [llm.params]
            top_p = 0.9

            [stable_diffusion]
            base_url = "http://172.16.100.249:7861"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model_name, "qwen2.5");
        assert_eq!(config.llm.temperature, 0.3);
        assert_eq!(config.llm.max_retries, 3);
        assert_eq!(config.llm.params["top_p"], serde_json::json!(0.9));
        assert_eq!(config.stable_diffusion.base_url, "http://172.16.100.249:7861");
        assert_eq!(config.stable_diffusion.timeout_secs, 300);
        assert_eq!(config.prompts.key, "agent_com");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_LLM_MODEL, "llama"),
            (ENV_SD_BASE_URL, "http://sd:7861"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.llm.model_name, "llama");
        assert_eq!(config.stable_diffusion.base_url, "http://sd:7861");
        assert_eq!(config.llm.base_url, "http://localhost:8004/v1");
    }

    #[test]
    fn test_agent_config() {
        let mut config = AppConfig::default();
        config.llm.params.insert("top_p".into(), serde_json::json!(0.5));

        let agent = config.agent_config("system").unwrap();
        assert_eq!(agent.system_prompt, "system");
        assert_eq!(agent.max_retries, 3);
        assert_eq!(agent.timeout, Duration::from_secs(150));
        assert_eq!(agent.generation["temperature"], serde_json::json!(0.1));
        assert_eq!(agent.generation["top_p"], serde_json::json!(0.5));
    }

    #[test]
    fn test_agent_config_rejects_zero_retries() {
        let mut config = AppConfig::default();
        config.llm.max_retries = 0;
        assert!(config.agent_config("system").is_err());
    }
}
