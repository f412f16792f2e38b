// img2img-service - HTTP front end for Stable Diffusion img2img

use clap::Parser;
use imagent::Img2ImgClient;
use photogen::AppConfig;
use photogen::service::{Img2ImgState, img2img_router, serve};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve Stable Diffusion img2img over HTTP", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides [service] host)
    #[arg(long)]
    host: Option<String>,

    /// Port (overrides [service] img2img_port)
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
    let port = args.port.unwrap_or(config.service.img2img_port);

    tracing::info!("Stable Diffusion at {}", config.stable_diffusion.base_url);
    let state = Img2ImgState {
        client: Img2ImgClient::new(&config.stable_diffusion.base_url, config.sd_timeout())?,
        result_dir: config.stable_diffusion.result_dir.clone(),
    };

    serve(img2img_router(Arc::new(state)), &host, port).await?;
    Ok(())
}
