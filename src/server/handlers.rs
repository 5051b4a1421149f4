//! HTTP request handlers for API endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::{info, warn};

use super::AppState;
use super::error::{ApiError, ApiResult};
use super::stream::serve_video;
use crate::media::Thumbnail;
use crate::media::gallery::collect_thumbnails;
use crate::metrics::MetricsRecord;

/// Dataset name the analysis pipeline is always asked about
pub const DATASET: &str = "VIDEOPULSE";

#[derive(Debug, Serialize, Deserialize)]
pub struct ThumbnailsResponse {
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Thumbnails for every readable clip, in catalog order
///
/// Never fails: clips that cannot be decoded are left out.
pub async fn list_thumbnails(State(state): State<AppState>) -> Json<ThumbnailsResponse> {
    let thumbnails = collect_thumbnails(&state.catalog, state.thumbnail_workers).await;
    Json(ThumbnailsResponse { thumbnails })
}

/// Pulse metrics for one clip from the analysis pipeline
pub async fn get_metrics(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<MetricsRecord>> {
    let record = state.proxy.fetch(&video_id, DATASET).await.map_err(|e| {
        warn!("Metrics for {} unavailable: {}", video_id, e);
        ApiError::from(e)
    })?;

    Ok(Json(record))
}

/// Raw clip bytes, with byte-range support for scrubbing
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let catalog = state.catalog.clone();
    let lookup_id = video_id.clone();
    let path = task::spawn_blocking(move || catalog.resolve(&lookup_id))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    info!("Streaming {} from {}", video_id, path.display());
    serve_video(&path, &headers).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::to_bytes;
    use axum::http::{StatusCode, header};
    use reqwest::Url;
    use tempfile::tempdir;

    fn state_for(dir: &std::path::Path) -> AppState {
        let config = Config::new(dir, Url::parse("http://127.0.0.1:1/run_pipeline").unwrap());
        AppState::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_get_video_streams_exact_match() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"aaaa").unwrap();
        std::fs::write(dir.path().join("ab.mp4"), b"abab").unwrap();
        let state = state_for(dir.path());

        let response = get_video(State(state), Path("a".to_string()), HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"aaaa");
    }

    #[tokio::test]
    async fn test_get_video_unknown_id_is_not_found() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("abc.mp4"), b"abc").unwrap();
        let state = state_for(dir.path());

        for id in ["c", "ab", "abc.mp4", "../abc"] {
            let err = get_video(State(state.clone()), Path(id.to_string()), HeaderMap::new())
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::NOT_FOUND);
            assert_eq!(err.message, "Video not found");
        }
    }

    #[tokio::test]
    async fn test_list_thumbnails_empty_directory() {
        let dir = tempdir().unwrap();
        let Json(payload) = list_thumbnails(State(state_for(dir.path()))).await;
        assert!(payload.thumbnails.is_empty());
    }
}
