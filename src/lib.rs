#![deny(clippy::all)]

//! Media backend for a pulse-analysis gallery: lists clip thumbnails,
//! streams clip bytes and proxies per-clip metrics from an external
//! analysis pipeline.

pub mod config;
pub mod media;
pub mod metrics;
pub mod server;

pub use config::Config;
pub use media::catalog::VideoCatalog;
pub use media::{Thumbnail, VideoRecord};
pub use metrics::{MetricsProxy, MetricsRecord, ProxyError};
pub use server::{AppState, build_router, serve, start_server};
