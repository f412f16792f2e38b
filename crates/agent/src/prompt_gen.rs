// Prompt generator - caller-level wrapper that rejects echoed input

use crate::agent::CompletionAgent;
use crate::error::Result;
use crate::template::PromptValues;

/// Placeholder the human template uses for the caller's raw input
pub const DATA_INPUT: &str = "data_input";

/// Turns a raw user prompt into a refined one through a [`CompletionAgent`].
///
/// A result identical to the raw input means the model echoed instead of
/// transforming it; that is reported as "no result" rather than an error.
pub struct PromptGenerator {
    agent: CompletionAgent,
}

impl PromptGenerator {
    pub fn new(agent: CompletionAgent) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &CompletionAgent {
        &self.agent
    }

    /// Generate a refined prompt for `data_input`.
    ///
    /// Returns `Ok(None)` when the output is empty or equals the input.
    /// Render, transport and retry failures are returned as errors.
    pub async fn generate(&self, data_input: &str) -> Result<Option<String>> {
        let values = PromptValues::from([(DATA_INPUT.to_string(), data_input.to_string())]);
        let result = self.agent.complete(&values).await?;
        tracing::info!(agent = %self.agent.config().agent_name, "Prompt generated");

        if result == data_input {
            tracing::error!("Agent returned input data instead of generated content");
            return Ok(None);
        }
        if result.trim().is_empty() {
            tracing::error!("Agent returned empty content");
            return Ok(None);
        }

        Ok(Some(result))
    }
}
