use super::VideoRecord;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of the only container the catalog serves
pub const VIDEO_EXTENSION: &str = ".mp4";

/// Id for a directory entry name, or `None` if the entry is not a clip
///
/// Listing and resolution both go through this, so every listed id resolves
/// back to the same file.
pub fn video_id_for(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(VIDEO_EXTENSION)
        .filter(|id| !id.is_empty())
}

/// Read-only view of the configured video directory
#[derive(Debug, Clone)]
pub struct VideoCatalog {
    directory: PathBuf,
}

impl VideoCatalog {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let directory = std::path::absolute(&directory).unwrap_or(directory);
        Self { directory }
    }

    /// All clips in the directory, sorted by file name
    ///
    /// A missing or unreadable directory is an empty catalog.
    pub fn list(&self) -> Vec<VideoRecord> {
        let entries = match std::fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    "Video directory {} not readable: {}",
                    self.directory.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| video_id_for(name).is_some())
            .collect();
        names.sort();

        names
            .into_iter()
            .filter_map(|name| {
                let id = video_id_for(&name)?.to_string();
                Some(VideoRecord {
                    id,
                    path: self.directory.join(&name),
                })
            })
            .collect()
    }

    /// Path of the clip whose id is exactly `id`
    pub fn resolve(&self, id: &str) -> Option<PathBuf> {
        self.list()
            .into_iter()
            .find(|record| record.id == id)
            .map(|record| record.path)
    }
}
