//! HTTP surface of the gallery
//!
//! Three stateless endpoints plus a health probe:
//! - `GET /thumbnails`: previews for every clip in the video directory
//! - `GET /video/{video_id}`: clip bytes (ranged)
//! - `GET /metrics/{video_id}`: pulse metrics from the analysis pipeline
//!
//! CORS is fully permissive, which suits a local demo deployment only.

mod error;
mod handlers;
mod stream;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::media::catalog::VideoCatalog;
use crate::metrics::{MetricsProxy, ProxyError};

pub use error::{ApiError, ApiResult};
pub use handlers::*;
pub use stream::{VIDEO_MIME, serve_video};

/// Read-only collaborators shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: VideoCatalog,
    pub proxy: MetricsProxy,
    pub thumbnail_workers: usize,
}

impl AppState {
    /// Build the catalog and proxy from `config`
    ///
    /// # Errors
    /// Returns an error if the outbound HTTP client cannot be built
    pub fn new(config: &Config) -> Result<Self, ProxyError> {
        Ok(Self {
            catalog: VideoCatalog::new(&config.video_directory),
            proxy: MetricsProxy::new(
                config.analysis_service_url.clone(),
                config.analysis_timeout(),
            )?,
            thumbnail_workers: config.thumbnail_workers(),
        })
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/thumbnails", get(list_thumbnails))
        .route("/metrics/{video_id}", get(get_metrics))
        .route("/video/{video_id}", get(get_video))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already bound listener until the process stops
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router(state)).await
}

/// Start the API server
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
