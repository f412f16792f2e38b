// img2img service routes

use super::envelope::{ApiError, ApiResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as UrlPath, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use imagent::{DEFAULT_OUTPUT_DIR, ImageGenError, ImageMetadata, Img2ImgClient, Img2ImgRequest};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub struct Img2ImgState {
    pub client: Img2ImgClient,

    /// Where img2img writes and `/result/...` serves from
    pub result_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct Img2ImgData {
    pub images: Vec<ImageMetadata>,
}

pub fn routes(state: Arc<Img2ImgState>) -> Router {
    Router::new()
        .route("/img2img", post(img2img))
        .route("/health", get(health))
        .route("/result/*path", get(result_file))
        .with_state(state)
}

async fn img2img(
    State(state): State<Arc<Img2ImgState>>,
    payload: Result<Json<Img2ImgRequest>, JsonRejection>,
) -> Result<ApiResponse<Img2ImgData>, ApiError> {
    let Json(mut request) = payload?;
    check_output_dir(&request.output_dir)?;
    request
        .validate()
        .map_err(|err| ApiError::unprocessable(err.to_string()))?;
    request.output_dir = resolve_output_dir(&state.result_dir, &request.output_dir);

    let started = Instant::now();
    match state.client.generate_and_save(&request).await {
        Ok(images) => {
            Ok(ApiResponse::success(Img2ImgData { images })
                .with_elapsed(started.elapsed().as_secs_f64()))
        }
        Err(err) => {
            let err = match err {
                ImageGenError::InvalidConfig(msg) => ApiError::unprocessable(msg),
                other => ApiError::from(other),
            };
            Err(err.with_elapsed(started.elapsed().as_secs_f64()))
        }
    }
}

/// Requested folders are relative and may not climb out of the result directory
fn check_output_dir(dir: &Path) -> Result<(), ApiError> {
    let escapes = dir.is_absolute()
        || dir
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ApiError::unprocessable(format!(
            "output_dir must be a relative path without '..', got {}",
            dir.display()
        )));
    }
    Ok(())
}

/// The default folder is the result directory itself; anything else is a
/// subfolder of it, so every image stays reachable under `/result`
fn resolve_output_dir(result_dir: &Path, requested: &Path) -> PathBuf {
    if requested == Path::new(DEFAULT_OUTPUT_DIR) {
        result_dir.to_path_buf()
    } else {
        result_dir.join(requested)
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "service": "img2img"}))
}

async fn result_file(
    State(state): State<Arc<Img2ImgState>>,
    UrlPath(requested): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let relative = Path::new(&requested);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    let name = relative
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|_| plain)
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let content_type = content_type(name).ok_or_else(|| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "Only png, jpg and jpeg files are served",
        )
    })?;

    let path = state.result_dir.join(relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type)], bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::not_found("File not found"))
        }
        Err(err) => {
            tracing::error!("Failed to read {}: {}", path.display(), err);
            Err(ApiError::internal("Failed to read result file"))
        }
    }
}

fn content_type(name: &str) -> Option<&'static str> {
    let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}
