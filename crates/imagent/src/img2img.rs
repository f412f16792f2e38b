// img2img client for the Stable Diffusion WebUI API

use crate::{
    check_status, endpoint, http_client, ImageGenError, ImageMetadata, Result,
    DEFAULT_OUTPUT_DIR, DEFAULT_SAMPLER,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Request fields that extra keys may not shadow
const TYPED_FIELDS: &[&str] = &[
    "images_b64",
    "prompt",
    "negative_prompt",
    "steps",
    "cfg_scale",
    "denoising_strength",
    "sampler_name",
    "output_dir",
];

fn default_steps() -> u32 {
    30
}

fn default_cfg_scale() -> f64 {
    7.0
}

fn default_denoising_strength() -> f64 {
    0.75
}

fn default_sampler() -> String {
    DEFAULT_SAMPLER.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

/// Parameters for one img2img generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Img2ImgRequest {
    /// Base64-encoded init images (at least one)
    pub images_b64: Vec<String>,

    /// Positive prompt
    pub prompt: String,

    #[serde(default)]
    pub negative_prompt: String,

    /// Sampling steps, 1..=150
    #[serde(default = "default_steps")]
    pub steps: u32,

    /// Classifier-free guidance scale, 1.0..=30.0
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,

    /// How far to move away from the init image, 0.0..=1.0
    #[serde(default = "default_denoising_strength")]
    pub denoising_strength: f64,

    #[serde(default = "default_sampler")]
    pub sampler_name: String,

    /// Folder the images and `metadata.json` are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Any other top-level fields, passed through to the API.
    /// They never replace a field set above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Img2ImgRequest {
    pub fn new(images_b64: Vec<String>, prompt: impl Into<String>) -> Self {
        Self {
            images_b64,
            prompt: prompt.into(),
            negative_prompt: String::new(),
            steps: default_steps(),
            cfg_scale: default_cfg_scale(),
            denoising_strength: default_denoising_strength(),
            sampler_name: default_sampler(),
            output_dir: default_output_dir(),
            extra: Map::new(),
        }
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.images_b64.is_empty() {
            return Err(ImageGenError::InvalidConfig("images_b64 must not be empty".into()));
        }
        if !(1..=150).contains(&self.steps) {
            return Err(ImageGenError::InvalidConfig(format!(
                "steps must be between 1 and 150, got {}",
                self.steps
            )));
        }
        if !(1.0..=30.0).contains(&self.cfg_scale) {
            return Err(ImageGenError::InvalidConfig(format!(
                "cfg_scale must be between 1.0 and 30.0, got {}",
                self.cfg_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.denoising_strength) {
            return Err(ImageGenError::InvalidConfig(format!(
                "denoising_strength must be between 0.0 and 1.0, got {}",
                self.denoising_strength
            )));
        }
        Ok(())
    }

    /// Request body for `/sdapi/v1/img2img`
    pub fn payload(&self) -> Value {
        let mut payload = json!({
            "init_images": self.images_b64,
            "prompt": self.prompt,
            "negative_prompt": self.negative_prompt,
            "sampler_name": self.sampler_name,
            "sampler_index": self.sampler_name,
            "steps": self.steps,
            "cfg_scale": self.cfg_scale,
            "denoising_strength": self.denoising_strength,
            "send_images": true,
            "save_images": false,
        });
        if let Value::Object(map) = &mut payload {
            for (key, value) in &self.extra {
                if !map.contains_key(key) && !TYPED_FIELDS.contains(&key.as_str()) {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
        payload
    }
}

/// img2img client
pub struct Img2ImgClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl Img2ImgClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(ImageGenError::InvalidConfig(
                "Stable Diffusion base URL is empty".into(),
            ));
        }

        Ok(Self {
            client: http_client()?,
            endpoint: endpoint(base_url, "/sdapi/v1/img2img"),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send the request and return the raw API response
    pub async fn generate(&self, request: &Img2ImgRequest) -> Result<Value> {
        request.validate()?;
        tracing::info!("Requesting img2img from {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request.payload())
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Generate, write every image as `img2img_{idx}.png` plus `metadata.json`,
    /// and return the per-image metadata
    pub async fn generate_and_save(&self, request: &Img2ImgRequest) -> Result<Vec<ImageMetadata>> {
        request.validate()?;
        tokio::fs::create_dir_all(&request.output_dir).await?;

        let started = Instant::now();
        let response = self.generate(request).await?;
        let elapsed_time = started.elapsed().as_secs_f64();

        let images = match response.get("images") {
            Some(Value::Array(images)) => images.clone(),
            Some(_) => {
                return Err(ImageGenError::InvalidResponse(
                    "'images' is not an array".into(),
                ))
            }
            None => Vec::new(),
        };

        let mut metadata = Vec::with_capacity(images.len());
        for (idx, image) in images.into_iter().enumerate() {
            let Value::String(img_base64) = image else {
                return Err(ImageGenError::InvalidResponse(format!(
                    "image {} is not a base64 string",
                    idx
                )));
            };

            let path_file = request.output_dir.join(format!("img2img_{}.png", idx));
            let bytes = base64::engine::general_purpose::STANDARD.decode(&img_base64)?;
            tokio::fs::write(&path_file, bytes).await?;

            metadata.push(ImageMetadata {
                img_base64,
                path_file,
                elapsed_time,
            });
        }

        let metadata_path = request.output_dir.join("metadata.json");
        tokio::fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?).await?;
        tracing::info!(
            "Saved {} image(s) and metadata to {}",
            metadata.len(),
            request.output_dir.display()
        );

        Ok(metadata)
    }
}
