// Completion agent - templated chat completion with bounded retries

use crate::config::AgentConfig;
use crate::error::{AgentError, Result, TemplateRenderError};
use crate::message::{ChatRequest, CompletionRequest, TokenUsage, Usage};
use crate::record::{CompletionRecord, FAILURE_MESSAGE, RecordSink, SUCCESS_MESSAGE, TracingSink};
use crate::template::{PromptTemplate, PromptValues};
use crate::transport::{ChatTransport, HttpTransport};
use std::sync::Arc;
use std::time::Instant;
use tracing::Level;

/// Text returned by [`CompletionAgent::system_prompt_text`] when rendering fails
pub const SYSTEM_PROMPT_ERROR: &str = "Error occurred while extracting system prompt";

/// Text returned by [`CompletionAgent::human_prompt_text`] when rendering fails
pub const HUMAN_PROMPT_ERROR: &str = "Error occurred while extracting human prompt";

/// Outcome of a single request to the endpoint
#[derive(Debug)]
pub(crate) enum Attempt {
    /// The endpoint finished with `stop`
    Accepted { text: String, usage: Option<Usage> },
    /// The endpoint answered but was cut off, filtered, or gave no reason
    NonTerminal {
        finish_reason: Option<String>,
        usage: Option<Usage>,
    },
    /// Network, status, or payload failure; ends the call
    TransportFailed(AgentError),
}

/// Wraps a chat completion endpoint with prompt templating, retry-until-stop
/// semantics, and one structured record per finished call.
///
/// The agent holds only immutable state, so a single instance can serve
/// concurrent calls (share it behind an `Arc`).
pub struct CompletionAgent {
    config: AgentConfig,
    system_template: PromptTemplate,
    human_template: PromptTemplate,
    transport: Arc<dyn ChatTransport>,
    sink: Arc<dyn RecordSink>,
}

impl CompletionAgent {
    /// Create an agent that talks HTTP and logs through `tracing`
    pub fn new(config: AgentConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, transport, Arc::new(TracingSink))
    }

    /// Create an agent with an explicit transport and record sink
    pub fn with_transport(
        config: AgentConfig,
        transport: Arc<dyn ChatTransport>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self> {
        let system_template = PromptTemplate::parse(config.system_prompt.as_str())?;
        let human_template = PromptTemplate::parse(config.human_prompt.as_str())?;

        Ok(Self {
            config,
            system_template,
            human_template,
            transport,
            sink,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Raw, unrendered human prompt template
    pub fn human_template(&self) -> &str {
        self.human_template.source()
    }

    /// Render both templates against `values`.
    ///
    /// Every placeholder declared by either template must be supplied, and
    /// every supplied value must be used by at least one template. Templates
    /// without placeholders ignore the values entirely.
    pub fn render(
        &self,
        values: &PromptValues,
    ) -> std::result::Result<CompletionRequest, TemplateRenderError> {
        let declared: Vec<&str> = self
            .system_template
            .placeholders()
            .into_iter()
            .chain(self.human_template.placeholders())
            .collect();

        if !declared.is_empty() {
            if let Some(extra) = values.keys().find(|k| !declared.contains(&k.as_str())) {
                return Err(TemplateRenderError::UnexpectedValue(extra.clone()));
            }
        }

        Ok(CompletionRequest {
            system: self.system_template.render(values)?,
            user: self.human_template.render(values)?,
        })
    }

    /// Rendered system prompt, or a fixed diagnostic string on failure
    pub fn system_prompt_text(&self, values: &PromptValues) -> String {
        self.system_template.render(values).unwrap_or_else(|e| {
            tracing::error!("Error rendering system prompt: {}", e);
            SYSTEM_PROMPT_ERROR.to_string()
        })
    }

    /// Rendered human prompt, or a fixed diagnostic string on failure
    pub fn human_prompt_text(&self, values: &PromptValues) -> String {
        self.human_template.render(values).unwrap_or_else(|e| {
            tracing::error!("Error rendering human prompt: {}", e);
            HUMAN_PROMPT_ERROR.to_string()
        })
    }

    /// Generate text for `values`, retrying non-terminal completions.
    ///
    /// Returns on the first attempt that finishes with `stop`. Transport
    /// failures end the call immediately. Dropping the returned future
    /// cancels the in-flight request and emits no record.
    pub async fn complete(&self, values: &PromptValues) -> Result<String> {
        let started = Instant::now();

        let rendered = self.render(values).map_err(|e| {
            tracing::error!(agent = %self.config.agent_name, "Failed to render prompt: {}", e);
            AgentError::from(e)
        })?;

        let request = ChatRequest {
            model: self.config.model_name.clone(),
            messages: rendered.messages(),
            params: self.config.generation.clone(),
        };

        let max_retries = self.config.max_retries;
        let mut last_usage = None;

        for attempt in 1..=max_retries {
            match self.attempt(&request).await {
                Attempt::Accepted { text, usage } => {
                    let record = CompletionRecord::success(
                        &self.config.agent_name,
                        started,
                        text.as_str(),
                        TokenUsage::from_usage(usage, &self.config.model_name),
                    );
                    self.sink.emit(Level::INFO, SUCCESS_MESSAGE, &record);
                    return Ok(text);
                }
                Attempt::NonTerminal {
                    finish_reason,
                    usage,
                } => {
                    tracing::warn!(
                        agent = %self.config.agent_name,
                        "Non-terminal completion ({}), attempt {} / {}",
                        finish_reason.as_deref().unwrap_or("none"),
                        attempt,
                        max_retries
                    );
                    if usage.is_some() {
                        last_usage = usage;
                    }
                }
                Attempt::TransportFailed(error) => {
                    return Err(self.fail(started, error, last_usage));
                }
            }
        }

        let error = AgentError::RetriesExhausted {
            attempts: max_retries,
            prompt: rendered.user,
        };
        Err(self.fail(started, error, last_usage))
    }

    /// Blocking variant of [`complete`](Self::complete).
    ///
    /// Runs the call on a private current-thread runtime, so it must not be
    /// called from inside an async context.
    pub fn complete_blocking(&self, values: &PromptValues) -> Result<String> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(AgentError::InvalidConfig(
                "complete_blocking called inside an async runtime; use complete".into(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AgentError::Transport(format!("Failed to start runtime: {}", e)))?;
        runtime.block_on(self.complete(values))
    }

    async fn attempt(&self, request: &ChatRequest) -> Attempt {
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => return Attempt::TransportFailed(e),
        };

        let Some(choice) = response.choices.first() else {
            return Attempt::TransportFailed(AgentError::Decode(
                "response contains no choices".into(),
            ));
        };

        if choice.is_terminal() {
            Attempt::Accepted {
                text: choice.content().unwrap_or_default().to_string(),
                usage: response.usage,
            }
        } else {
            Attempt::NonTerminal {
                finish_reason: choice.finish_reason.clone(),
                usage: response.usage,
            }
        }
    }

    /// Emit the failure record and hand the error back to the caller
    fn fail(&self, started: Instant, error: AgentError, usage: Option<Usage>) -> AgentError {
        tracing::error!(agent = %self.config.agent_name, "Failed to generate result: {:?}", error);
        let record = CompletionRecord::failure(
            &self.config.agent_name,
            started,
            error.to_string(),
            TokenUsage::from_usage(usage, &self.config.model_name),
        );
        self.sink.emit(Level::ERROR, FAILURE_MESSAGE, &record);
        error
    }
}
