pub mod catalog;
pub mod gallery;
pub mod preview;
pub mod video;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A clip found in the video directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// File name without its extension
    pub id: String,
    /// Absolute location of the clip
    pub path: PathBuf,
}

/// JPEG preview of one clip, serialized as `{video_id, thumbnail}` with the
/// image base64-encoded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub video_id: String,
    #[serde(rename = "thumbnail", with = "base64_serde")]
    pub image: Vec<u8>,
}

mod base64_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use base64::{Engine, engine::general_purpose};
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use base64::{Engine, engine::general_purpose};
        let s = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)
    }
}
