// agent - templated chat completion with bounded retries
// Renders system/user prompt templates, calls an OpenAI-compatible
// `/chat/completions` endpoint, and retries until the model finishes with `stop`.

mod agent;

pub mod config;
pub mod error;
pub mod message;
pub mod prompt_gen;
pub mod record;
pub mod template;
pub mod transport;

pub use agent::{CompletionAgent, HUMAN_PROMPT_ERROR, SYSTEM_PROMPT_ERROR};
pub use config::{AgentConfig, AgentConfigBuilder};
pub use error::{AgentError, Result, TemplateRenderError};
pub use message::{ChatMessage, CompletionRequest, TokenUsage};
pub use prompt_gen::{DATA_INPUT, PromptGenerator};
pub use record::{CompletionRecord, MemorySink, RecordOutcome, RecordSink, TracingSink};
pub use template::{PromptTemplate, PromptValues};
pub use transport::{ChatTransport, HttpTransport};
