// Error types for the completion agent

use thiserror::Error;

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while rendering prompts or talking to the endpoint
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Template render error: {0}")]
    TemplateRender(#[from] TemplateRenderError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed completion payload: {0}")]
    Decode(String),

    #[error("Max retries exceeded after {attempts} attempt(s) on query input {prompt}")]
    RetriesExhausted { attempts: u32, prompt: String },
}

impl AgentError {
    /// True for failures that come from the endpoint itself (network, status, payload)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AgentError::Transport(_) | AgentError::Status { .. } | AgentError::Decode(_)
        )
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AgentError::Decode(err.to_string())
        } else {
            AgentError::Transport(err.to_string())
        }
    }
}

/// A template could not be rendered against the supplied values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateRenderError {
    #[error("missing value for placeholder '{0}'")]
    MissingValue(String),

    #[error("unexpected value '{0}' not declared by any template")]
    UnexpectedValue(String),

    #[error("unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),

    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
}
