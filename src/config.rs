use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ANALYSIS_URL: &str = "http://localhost:8002/run_pipeline";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the gallery service
///
/// Every option can come from a flag or from the matching `PULSE_*`
/// environment variable. Built once at startup and moved into the server
/// state; nothing reads it from a global.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pulse-gallery",
    version,
    about = "Serves video thumbnails, video bytes and pulse metrics for a directory of clips"
)]
pub struct Config {
    /// Directory scanned (non-recursively) for .mp4 clips
    #[arg(long = "video-dir", env = "PULSE_VIDEO_DIR", default_value = "videos")]
    pub video_directory: PathBuf,

    /// Endpoint of the external analysis pipeline
    #[arg(long = "analysis-url", env = "PULSE_ANALYSIS_URL", default_value = DEFAULT_ANALYSIS_URL)]
    pub analysis_service_url: Url,

    /// Address the HTTP server binds to
    #[arg(long = "bind", env = "PULSE_BIND", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: String,

    /// Upper bound on a single call to the analysis pipeline, in seconds
    #[arg(
        long = "analysis-timeout-secs",
        env = "PULSE_ANALYSIS_TIMEOUT_SECS",
        default_value_t = DEFAULT_ANALYSIS_TIMEOUT_SECS
    )]
    pub analysis_timeout_secs: u64,

    /// Thumbnails decoded at once per listing. Default: available parallelism.
    #[arg(long = "thumbnail-workers", env = "PULSE_THUMBNAIL_WORKERS")]
    pub thumbnail_workers: Option<usize>,
}

impl Config {
    /// Config with defaults for everything except the two required locations
    pub fn new(video_directory: impl Into<PathBuf>, analysis_service_url: Url) -> Self {
        Self {
            video_directory: video_directory.into(),
            analysis_service_url,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            analysis_timeout_secs: DEFAULT_ANALYSIS_TIMEOUT_SECS,
            thumbnail_workers: None,
        }
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    pub fn thumbnail_workers(&self) -> usize {
        self.thumbnail_workers
            .or_else(|| std::thread::available_parallelism().ok().map(usize::from))
            .unwrap_or(4)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_args() {
        let config = Config::try_parse_from(["pulse-gallery"]).unwrap();
        assert_eq!(config.video_directory, PathBuf::from("videos"));
        assert_eq!(config.analysis_service_url.as_str(), DEFAULT_ANALYSIS_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.analysis_timeout(), Duration::from_secs(30));
        assert!(config.thumbnail_workers() >= 1);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "pulse-gallery",
            "--video-dir",
            "/srv/clips",
            "--analysis-url",
            "http://analysis.internal:9000/run_pipeline",
            "--analysis-timeout-secs",
            "5",
            "--thumbnail-workers",
            "0",
        ])
        .unwrap();
        assert_eq!(config.video_directory, PathBuf::from("/srv/clips"));
        assert_eq!(config.analysis_service_url.port(), Some(9000));
        assert_eq!(config.analysis_timeout(), Duration::from_secs(5));
        // zero workers would stall every listing
        assert_eq!(config.thumbnail_workers(), 1);
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = Config::try_parse_from(["pulse-gallery", "--analysis-url", "not a url"]);
        assert!(result.is_err());
    }
}
