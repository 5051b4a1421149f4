use super::preview::{encode_thumbnail, rgb_image_from_plane};
use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;
use std::path::Path;
use tracing::{debug, warn};

/// Position the preview frame is taken from, skipping black lead-in frames
pub const THUMBNAIL_OFFSET_MS: i64 = 1000;

/// Initialize FFmpeg (must be called once at startup)
pub fn init_ffmpeg() -> Result<()> {
    ffmpeg::init().context("Failed to initialize FFmpeg")?;

    Ok(())
}

/// JPEG preview for the clip at `video_path`, or `None` if the clip cannot be
/// opened or has no decodable frame at the start and at the one second mark
pub fn generate_thumbnail<P: AsRef<Path>>(video_path: P) -> Option<Vec<u8>> {
    let video_path = video_path.as_ref();
    match extract_thumbnail(video_path) {
        Ok(jpeg) => {
            debug!(
                "Generated thumbnail for {:?} ({} bytes)",
                video_path,
                jpeg.len()
            );
            Some(jpeg)
        }
        Err(e) => {
            warn!("Skipping thumbnail for {:?}: {:#}", video_path, e);
            None
        }
    }
}

/// Decode the first frame to check the stream is readable, then seek to
/// [`THUMBNAIL_OFFSET_MS`] and encode the first frame at or after it
pub fn extract_thumbnail<P: AsRef<Path>>(video_path: P) -> Result<Vec<u8>> {
    let mut input = ffmpeg::format::input(&video_path).context("Failed to open video file")?;

    let video_stream = input
        .streams()
        .best(ffmpeg::media::Type::Video)
        .context("Could not find video stream")?;
    let video_stream_index = video_stream.index();
    let time_base = f64::from(video_stream.time_base());

    let context_decoder =
        ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())
            .context("Failed to create codec context")?;
    let mut decoder = context_decoder
        .decoder()
        .video()
        .context("Failed to create video decoder")?;

    decode_frame_from(&mut input, &mut decoder, video_stream_index, time_base, None)
        .context("No decodable frame at start of video")?;

    let offset_seconds = THUMBNAIL_OFFSET_MS as f64 / 1000.0;
    let timestamp = THUMBNAIL_OFFSET_MS * i64::from(ffmpeg::ffi::AV_TIME_BASE) / 1000;
    input
        .seek(timestamp, ..timestamp)
        .context(format!("Failed to seek to {}ms", THUMBNAIL_OFFSET_MS))?;
    decoder.flush();

    let frame = decode_frame_from(
        &mut input,
        &mut decoder,
        video_stream_index,
        time_base,
        Some(offset_seconds),
    )
    .context(format!("No decodable frame at {}ms", THUMBNAIL_OFFSET_MS))?;

    // Convert frame to RGB24
    let mut scaler = ffmpeg::software::scaling::context::Context::get(
        frame.format(),
        frame.width(),
        frame.height(),
        ffmpeg::format::Pixel::RGB24,
        frame.width(),
        frame.height(),
        ffmpeg::software::scaling::flag::Flags::BILINEAR,
    )
    .context("Failed to create scaler")?;

    let mut rgb_frame = ffmpeg::util::frame::video::Video::empty();
    scaler
        .run(&frame, &mut rgb_frame)
        .context("Failed to scale frame")?;

    let img = rgb_image_from_plane(
        rgb_frame.width(),
        rgb_frame.height(),
        rgb_frame.stride(0),
        rgb_frame.data(0),
    )?;

    encode_thumbnail(img)
}

/// Next decoded frame of the video stream whose presentation time is at or
/// after `not_before` seconds (any frame when `None`)
///
/// Frames without a timestamp are accepted. Reaching end of stream drains
/// the decoder before giving up.
fn decode_frame_from(
    input: &mut ffmpeg::format::context::Input,
    decoder: &mut ffmpeg::decoder::Video,
    video_stream_index: usize,
    time_base: f64,
    not_before: Option<f64>,
) -> Option<ffmpeg::util::frame::video::Video> {
    let mut decoded_frame = ffmpeg::util::frame::video::Video::empty();
    let is_wanted = |frame: &ffmpeg::util::frame::video::Video| {
        let Some(not_before) = not_before else {
            return true;
        };
        match frame.timestamp().or(frame.pts()) {
            Some(pts) => pts as f64 * time_base >= not_before,
            None => true,
        }
    };

    for (stream, packet) in input.packets() {
        if stream.index() != video_stream_index {
            continue;
        }

        if let Err(e) = decoder.send_packet(&packet) {
            debug!("Decoder rejected packet: {}", e);
            continue;
        }

        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if is_wanted(&decoded_frame) {
                return Some(decoded_frame);
            }
        }
    }

    decoder.send_eof().ok();
    while decoder.receive_frame(&mut decoded_frame).is_ok() {
        if is_wanted(&decoded_frame) {
            return Some(decoded_frame);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_garbage_file_yields_no_thumbnail() {
        init_ffmpeg().unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.mp4");
        std::fs::write(&path, b"definitely not an mp4 container").unwrap();

        assert!(extract_thumbnail(&path).is_err());
        assert!(generate_thumbnail(&path).is_none());
    }

    #[test]
    fn test_missing_file_yields_no_thumbnail() {
        init_ffmpeg().unwrap();
        let dir = tempdir().unwrap();
        assert!(generate_thumbnail(dir.path().join("ghost.mp4")).is_none());
    }
}
