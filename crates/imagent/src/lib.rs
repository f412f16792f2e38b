// imagent - Stable Diffusion image generation over HTTP
// Clients for the AUTOMATIC1111 WebUI `txt2img` and `img2img` endpoints

// The fixed txt2img payload is a single large `json!` literal
#![recursion_limit = "256"]

mod encode;
mod img2img;
mod txt2img;

pub mod error;

pub use encode::file_to_base64;
pub use error::{ImageGenError, Result};
pub use img2img::{Img2ImgClient, Img2ImgRequest};
pub use txt2img::Txt2ImgClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for a single generation request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default sampler used by both endpoints
pub const DEFAULT_SAMPLER: &str = "DPM++ 2M Karras";

/// Folder img2img results go to when a request names none
pub const DEFAULT_OUTPUT_DIR: &str = "result";

/// An image produced by `txt2img` and written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// PNG data, base64 encoded as returned by the API
    pub base64: String,

    /// Absolute path of the saved file
    pub path: PathBuf,
}

/// Per-image metadata written by `img2img`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub img_base64: String,
    pub path_file: PathBuf,

    /// Seconds the generation request took
    pub elapsed_time: f64,
}

/// Trait for text-to-image backends
#[async_trait]
pub trait TextToImage: Send + Sync {
    /// Generate one image from a prompt and save it
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage>;
}

/// Build the shared HTTP client for the WebUI API
pub(crate) fn http_client() -> Result<reqwest::Client> {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| ImageGenError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-2xx response into an error carrying its JSON or text body
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => json.to_string(),
        Err(_) => body,
    };
    Err(ImageGenError::Status {
        status: status.as_u16(),
        detail,
    })
}

/// Join a base URL and an API path without doubling slashes
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("http://sd:7861/", "/sdapi/v1/txt2img"),
            "http://sd:7861/sdapi/v1/txt2img"
        );
        assert_eq!(
            endpoint("http://sd:7861", "/sdapi/v1/img2img"),
            "http://sd:7861/sdapi/v1/img2img"
        );
    }
}
