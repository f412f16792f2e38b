// imagent-bin - CLI for generating images through a Stable Diffusion WebUI

use clap::{Parser, Subcommand};
use imagent::{
    file_to_base64, ImageGenError, Img2ImgClient, Img2ImgRequest, Result, TextToImage,
    Txt2ImgClient,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate images with a Stable Diffusion WebUI (txt2img, img2img)", long_about = None)]
struct Args {
    /// WebUI base URL (falls back to SD_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "300")]
    timeout: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one image from a text prompt
    Txt2img {
        /// Text prompt describing the image to generate
        #[arg(short, long)]
        prompt: String,

        /// Directory the PNG is written to
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Transform an existing image
    Img2img {
        /// Init image (any format, sent as PNG)
        #[arg(short, long)]
        input: PathBuf,

        /// Positive prompt
        #[arg(short, long)]
        prompt: String,

        /// Negative prompt
        #[arg(long, default_value = "")]
        negative_prompt: String,

        /// Sampling steps
        #[arg(long, default_value = "30")]
        steps: u32,

        /// CFG scale
        #[arg(long, default_value = "7.0")]
        cfg_scale: f64,

        /// Denoising strength
        #[arg(long, default_value = "0.75")]
        denoising_strength: f64,

        /// Directory for images and metadata.json
        #[arg(short, long, default_value = "result")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for SD_BASE_URL)
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("✓ Loaded .env file from: {}", path.display());
    }

    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("imagent={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url = args
        .base_url
        .or_else(|| std::env::var("SD_BASE_URL").ok())
        .ok_or_else(|| {
            ImageGenError::InvalidConfig("pass --base-url or set SD_BASE_URL".into())
        })?;
    let timeout = Duration::from_secs(args.timeout);

    tracing::info!("Starting imagent-bin against {}", base_url);

    match args.command {
        Command::Txt2img { prompt, output } => {
            tracing::info!("Prompt: {}", prompt);
            let client = Txt2ImgClient::new(&base_url, output, timeout)?;
            let image = client.generate(&prompt).await?;
            println!("Image saved to: {}", image.path.display());
        }
        Command::Img2img {
            input,
            prompt,
            negative_prompt,
            steps,
            cfg_scale,
            denoising_strength,
            output,
        } => {
            tracing::info!("Init image: {}", input.display());
            let mut request = Img2ImgRequest::new(vec![file_to_base64(&input)?], prompt);
            request.negative_prompt = negative_prompt;
            request.steps = steps;
            request.cfg_scale = cfg_scale;
            request.denoising_strength = denoising_strength;
            request.output_dir = output;

            let client = Img2ImgClient::new(&base_url, timeout)?;
            let metadata = client.generate_and_save(&request).await?;
            for item in &metadata {
                println!("Image saved to: {}", item.path_file.display());
            }
            println!(
                "Metadata written to: {}",
                request.output_dir.join("metadata.json").display()
            );
        }
    }

    Ok(())
}
