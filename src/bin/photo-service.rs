// photo-service - HTTP service that turns raw requests into profile photos

use clap::Parser;
use photogen::service::{photo_router, serve};
use photogen::{AppConfig, PhotoGenerator};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate profile photos from raw prompts", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides [service] host)
    #[arg(long)]
    host: Option<String>,

    /// Port (overrides [service] photo_port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("✓ Loaded .env file from: {}", path.display());
    }

    let args = Args::parse();
    photogen::init_tracing(args.verbose);

    let config = AppConfig::load(args.config.as_deref())?;
    let host = args.host.unwrap_or_else(|| config.service.host.clone());
    let port = args.port.unwrap_or(config.service.photo_port);

    tracing::info!(
        "LLM endpoint {} (model '{}'), Stable Diffusion at {}",
        config.llm.base_url,
        config.llm.model_name,
        config.stable_diffusion.base_url
    );
    let generator = PhotoGenerator::from_config(&config)?;

    serve(photo_router(Arc::new(generator)), &host, port).await?;
    Ok(())
}
