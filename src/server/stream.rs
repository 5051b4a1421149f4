use super::error::{ApiError, ApiResult};
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use http_range::{HttpRange, HttpRangeParseError};
use std::path::Path;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, SeekFrom},
};
use tokio_util::io::ReaderStream;
use tracing::debug;

pub const VIDEO_MIME: &str = "video/mp4";

// default capacity 64KiB
const DEFAULT_CAPACITY: usize = 65536;

/// Stream the file at `path` as `video/mp4`, honouring a single byte range
///
/// The body is read from disk as the client consumes it. Dropping the
/// response (client gone) closes the file.
pub async fn serve_video(path: &Path, headers: &HeaderMap) -> ApiResult<Response> {
    let mut file = File::open(path)
        .await
        .map_err(|_| ApiError::not_found("Video not found"))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .len();

    let resp = Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static(VIDEO_MIME))
        .header(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    // Empty files
    if len == 0 {
        return resp
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, 0)
            .body(Body::empty())
            .map_err(internal);
    }

    let range = match headers.get(header::RANGE).map(|value| value.to_str()) {
        Some(Ok(value)) => match HttpRange::parse(value, len) {
            Ok(mut ranges) if ranges.len() == 1 => ranges.pop(),
            // TODO: multipart/byteranges responses for multi-range requests
            Ok(_) | Err(HttpRangeParseError::NoOverlap) => {
                return resp
                    .status(StatusCode::RANGE_NOT_SATISFIABLE)
                    .header(header::CONTENT_RANGE, format!("bytes */{len}"))
                    .body(Body::empty())
                    .map_err(internal);
            }
            Err(HttpRangeParseError::InvalidRange) => {
                debug!("Ignoring invalid range header {:?}", value);
                None
            }
        },
        Some(Err(_)) | None => None,
    };

    let Some(range) = range else {
        return resp
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, len)
            .body(Body::from_stream(ReaderStream::with_capacity(
                file,
                DEFAULT_CAPACITY,
            )))
            .map_err(internal);
    };

    file.seek(SeekFrom::Start(range.start))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    resp.status(StatusCode::PARTIAL_CONTENT)
        .header(
            header::CONTENT_RANGE,
            format!(
                "bytes {}-{}/{}",
                range.start,
                range.start + range.length - 1,
                len
            ),
        )
        .header(header::CONTENT_LENGTH, range.length)
        .body(Body::from_stream(ReaderStream::with_capacity(
            file.take(range.length),
            DEFAULT_CAPACITY,
        )))
        .map_err(internal)
}

fn internal(err: axum::http::Error) -> ApiError {
    ApiError::internal(err.to_string())
}
