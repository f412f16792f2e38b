// Error types for imagent

use thiserror::Error;

/// Result type for imagent operations
pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Errors that can occur during image generation
#[derive(Error, Debug)]
pub enum ImageGenError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<image::ImageError> for ImageGenError {
    fn from(err: image::ImageError) -> Self {
        ImageGenError::ImageProcessing(err.to_string())
    }
}
