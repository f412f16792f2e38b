// Response envelope shared by both services

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use agent::AgentError;
use imagent::ImageGenError;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// `{status, data, error, elapsed_time}` plus an optional `message`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: Option<T>,
    pub error: Option<String>,
    pub elapsed_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            data: Some(data),
            error: None,
            elapsed_time: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_elapsed(mut self, seconds: f64) -> Self {
        self.elapsed_time = Some(seconds);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Error envelope with its HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiResponse<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiResponse {
                status: STATUS_ERROR,
                data: None,
                error: Some(message.into()),
                elapsed_time: None,
                message: None,
            },
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn with_elapsed(mut self, seconds: f64) -> Self {
        self.body.elapsed_time = Some(seconds);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        tracing::error!("Request failed: {}", err);
        Self::internal(public_message(&err))
    }
}

impl From<ImageGenError> for ApiError {
    fn from(err: ImageGenError) -> Self {
        tracing::error!("Image generation failed: {}", err);
        Self::internal(image_message(&err))
    }
}

/// Client-facing text for an error; upstream bodies stay in the logs
fn public_message(err: &crate::Error) -> String {
    match err {
        crate::Error::Agent(err) => match err {
            AgentError::Status { status, .. } => {
                format!("LLM endpoint returned HTTP {}", status)
            }
            AgentError::Decode(_) => "LLM endpoint returned a malformed response".to_string(),
            AgentError::Transport(_) => "LLM endpoint could not be reached".to_string(),
            other => other.to_string(),
        },
        crate::Error::Image(err) => image_message(err),
        crate::Error::Io(_) | crate::Error::Json(_) | crate::Error::Toml(_) => {
            "Internal server error".to_string()
        }
        other => other.to_string(),
    }
}

fn image_message(err: &ImageGenError) -> String {
    match err {
        ImageGenError::Status { status, .. } => {
            format!("Stable Diffusion returned HTTP {}", status)
        }
        ImageGenError::Http(_) => "Stable Diffusion could not be reached".to_string(),
        ImageGenError::InvalidConfig(msg) => msg.clone(),
        _ => "Stable Diffusion returned an unusable response".to_string(),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}
