// Photo generator - refines a raw request with the LLM, then renders it with txt2img

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::prompts::load_system_prompt;
use agent::{CompletionAgent, PromptGenerator};
use imagent::{TextToImage, Txt2ImgClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of one photo generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub id: String,
    pub base64: String,
    pub path_file: String,
}

pub struct PhotoGenerator {
    prompts: PromptGenerator,
    text2img: Arc<dyn TextToImage>,
}

impl PhotoGenerator {
    pub fn new(prompts: PromptGenerator, text2img: Arc<dyn TextToImage>) -> Self {
        Self { prompts, text2img }
    }

    /// Build the agent and txt2img client described by `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let system_prompt = load_system_prompt(&config.prompts.path, &config.prompts.key)?;
        let agent = CompletionAgent::new(config.agent_config(system_prompt)?)?;
        let text2img = Txt2ImgClient::new(
            &config.stable_diffusion.base_url,
            config.stable_diffusion.output_dir.clone(),
            config.sd_timeout(),
        )?;

        Ok(Self::new(PromptGenerator::new(agent), Arc::new(text2img)))
    }

    /// Turn a raw request into a saved image
    pub async fn process_generate_image(&self, prompt: &str) -> Result<PhotoMetadata> {
        tracing::info!("Process generate photo with prompt: {}", prompt);
        let id = session_id();

        let generated = self.prompts.generate(prompt).await?.ok_or(Error::EmptyPrompt)?;
        let cleaned = clean_prompt(&generated);
        if cleaned.is_empty() {
            return Err(Error::EmptyPrompt);
        }
        tracing::info!("Result generator prompt: {}", cleaned);

        let image = self.text2img.generate(&cleaned).await?;

        Ok(PhotoMetadata {
            id,
            base64: image.base64,
            path_file: image.path.display().to_string(),
        })
    }
}

/// Strip quoting and JSON debris the model tends to wrap prompts in
pub fn clean_prompt(raw: &str) -> String {
    raw.trim_matches('"')
        .replace("\\\"", "\"")
        .replace('"', "")
        .replace(['{', '}'], "")
        .replace("response:", "")
        .trim()
        .to_string()
}

/// Short random id for one generation
pub fn session_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("session_{}", &uuid[..8])
}
