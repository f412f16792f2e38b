// photogen - LLM-refined photo generation services
// Refines raw requests into Stable Diffusion prompts and serves txt2img / img2img over HTTP

pub mod config;
pub mod error;
pub mod photo;
pub mod prompts;
pub mod service;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use photo::{PhotoGenerator, PhotoMetadata};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the fmt subscriber; `RUST_LOG` wins over the default filter
pub fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("photogen={level},agent={level},imagent={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
