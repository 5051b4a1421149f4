//! Gallery server binary entry point

use anyhow::Context;
use clap::Parser;
use pulse_gallery::media::video::init_ffmpeg;
use pulse_gallery::{AppState, Config, start_server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse_gallery=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    init_ffmpeg()?;

    tracing::info!(
        "Serving videos from {} with analysis at {}",
        config.video_directory.display(),
        config.analysis_service_url
    );
    if !config.video_directory.is_dir() {
        tracing::warn!(
            "Video directory {} does not exist yet; listings will be empty",
            config.video_directory.display()
        );
    }

    let state = AppState::new(&config).context("Failed to build server state")?;
    start_server(&config.bind_addr, state)
        .await
        .with_context(|| format!("Server on {} stopped", config.bind_addr))?;

    Ok(())
}
