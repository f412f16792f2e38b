// Photo profile service routes

use super::envelope::{ApiError, ApiResponse};
use crate::photo::{PhotoGenerator, PhotoMetadata};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Deserialize)]
pub struct PhotoRequest {
    pub prompt: String,
}

pub fn routes(generator: Arc<PhotoGenerator>) -> Router {
    Router::new()
        .route("/generate-photo-profile/", post(generate_photo_profile))
        .route("/health", get(health))
        .with_state(generator)
}

async fn generate_photo_profile(
    State(generator): State<Arc<PhotoGenerator>>,
    payload: Result<Json<PhotoRequest>, JsonRejection>,
) -> Result<ApiResponse<PhotoMetadata>, ApiError> {
    let Json(request) = payload?;
    let started = Instant::now();

    match generator.process_generate_image(&request.prompt).await {
        Ok(metadata) => Ok(ApiResponse::success(metadata)
            .with_message("Photo generated successfully")
            .with_elapsed(started.elapsed().as_secs_f64())),
        Err(err) => Err(ApiError::from(err).with_elapsed(started.elapsed().as_secs_f64())),
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "service": "photo-profile"}))
}
