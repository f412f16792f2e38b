// txt2img client for the Stable Diffusion WebUI API

use crate::{
    check_status, endpoint, http_client, GeneratedImage, ImageGenError, Result, TextToImage,
    DEFAULT_SAMPLER,
};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Negative prompt applied to every portrait request
pub const DEFAULT_NEGATIVE_PROMPT: &str = "blurry, low quality, distorted face, extra limbs, watermark, text, logo, disabled, deformed, disfigured, bad anatomy, more than one person, multiple people";

/// Checkpoint forced through `override_settings`
pub const DEFAULT_CHECKPOINT: &str = "realisticUniversalBase_100.safetensors";

#[derive(Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

/// Minimal txt2img client with a fixed generation payload
pub struct Txt2ImgClient {
    client: reqwest::Client,
    endpoint: String,
    output_dir: PathBuf,
    timeout: Duration,
}

impl Txt2ImgClient {
    /// Create a client for the WebUI at `base_url`, saving images into `output_dir`
    pub fn new(base_url: &str, output_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(ImageGenError::InvalidConfig(
                "Stable Diffusion base URL is empty".into(),
            ));
        }

        Ok(Self {
            client: http_client()?,
            endpoint: endpoint(base_url, "/sdapi/v1/txt2img"),
            output_dir: output_dir.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Default payload with the prompt filled in
    pub fn build_payload(prompt: &str) -> Value {
        json!({
            "prompt": prompt,
            "negative_prompt": DEFAULT_NEGATIVE_PROMPT,
            "styles": [],
            "seed": -1,
            "subseed": -1,
            "subseed_strength": 0,
            "seed_resize_from_h": -1,
            "seed_resize_from_w": -1,
            "sampler_name": DEFAULT_SAMPLER,
            "scheduler": "Karras",
            "batch_size": 1,
            "n_iter": 1,
            "steps": 30,
            "cfg_scale": 7,
            "width": 512,
            "height": 512,
            "restore_faces": true,
            "tiling": false,
            "do_not_save_samples": false,
            "do_not_save_grid": false,
            "eta": 0,
            "denoising_strength": 0,
            "override_settings": {
                "sd_model_checkpoint": DEFAULT_CHECKPOINT
            },
            "override_settings_restore_afterwards": true,
            "refiner_checkpoint": "",
            "refiner_switch_at": 0.8,
            "disable_extra_networks": false,
            "firstpass_image": "",
            "comments": {},
            "enable_hr": false,
            "firstphase_width": 0,
            "firstphase_height": 0,
            "hr_scale": 2,
            "hr_upscaler": "Latent",
            "hr_second_pass_steps": 20,
            "hr_resize_x": 0,
            "hr_resize_y": 0,
            "hr_checkpoint_name": "",
            "hr_sampler_name": DEFAULT_SAMPLER,
            "hr_scheduler": "Karras",
            "hr_prompt": "",
            "hr_negative_prompt": "",
            "force_task_id": "",
            "sampler_index": DEFAULT_SAMPLER,
            "script_name": "",
            "script_args": [],
            "send_images": true,
            "save_images": true,
            "alwayson_scripts": {},
            "infotext": ""
        })
    }

    /// File name for a prompt's image: `<hash % 1_000_000>.png`
    pub fn file_name(prompt: &str) -> String {
        let mut hasher = DefaultHasher::new();
        prompt.hash(&mut hasher);
        format!("{}.png", hasher.finish() % 1_000_000)
    }
}

#[async_trait]
impl TextToImage for Txt2ImgClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        tracing::info!("Requesting txt2img from {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&Self::build_payload(prompt))
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: Txt2ImgResponse = response.json().await?;

        let image_b64 = body
            .images
            .into_iter()
            .next()
            .ok_or_else(|| ImageGenError::InvalidResponse("response contains no images".into()))?;
        let png_bytes = base64::engine::general_purpose::STANDARD.decode(&image_b64)?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let out_file = self.output_dir.join(Self::file_name(prompt));
        tokio::fs::write(&out_file, &png_bytes).await?;
        let path = tokio::fs::canonicalize(&out_file).await?;

        tracing::info!("Saved generated image to {}", path.display());

        Ok(GeneratedImage {
            base64: image_b64,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults() {
        let payload = Txt2ImgClient::build_payload("a young man in a suit");
        assert_eq!(payload["prompt"], "a young man in a suit");
        assert_eq!(payload["steps"], 30);
        assert_eq!(payload["width"], 512);
        assert_eq!(payload["restore_faces"], true);
        assert_eq!(payload["sampler_name"], DEFAULT_SAMPLER);
        assert_eq!(payload["override_settings"]["sd_model_checkpoint"], DEFAULT_CHECKPOINT);
    }

    #[test]
    fn test_payload_is_complete() {
        let payload = Txt2ImgClient::build_payload("p");
        let fields = payload.as_object().unwrap();
        assert_eq!(fields.len(), 50);
        assert_eq!(payload["hr_scheduler"], "Karras");
        assert_eq!(payload["save_images"], true);
        assert_eq!(payload["infotext"], "");
    }

    #[test]
    fn test_file_name_is_stable() {
        let name = Txt2ImgClient::file_name("portrait");
        assert_eq!(name, Txt2ImgClient::file_name("portrait"));
        assert!(name.ends_with(".png"));
        let stem: u64 = name.trim_end_matches(".png").parse().unwrap();
        assert!(stem < 1_000_000);
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let result = Txt2ImgClient::new("  ", "output", crate::DEFAULT_TIMEOUT);
        assert!(matches!(result, Err(ImageGenError::InvalidConfig(_))));
    }
}
