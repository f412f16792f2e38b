//! HTTP front ends for the photo pipeline and img2img

pub mod envelope;
pub mod img2img;
pub mod photo;

pub use envelope::{ApiError, ApiResponse};
pub use img2img::Img2ImgState;

use crate::photo::PhotoGenerator;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Router for the photo profile service
pub fn photo_router(generator: Arc<PhotoGenerator>) -> Router {
    photo::routes(generator).layer(cors())
}

/// Router for the img2img service
pub fn img2img_router(state: Arc<Img2ImgState>) -> Router {
    img2img::routes(state).layer(cors())
}

/// Bind and serve until Ctrl+C
pub async fn serve(router: Router, host: &str, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Ctrl+C received, shutting down gracefully");
}
