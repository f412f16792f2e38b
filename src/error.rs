// Error types for photogen

use thiserror::Error;

/// Result type for photogen operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt '{key}' not found in {path}")]
    PromptNotFound { key: String, path: String },

    #[error("Agent did not return a prompt (empty response)")]
    EmptyPrompt,

    #[error(transparent)]
    Agent(#[from] agent::AgentError),

    #[error(transparent)]
    Image(#[from] imagent::ImageGenError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
