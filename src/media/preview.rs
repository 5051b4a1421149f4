use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, RgbImage};

/// Longest edge allowed for a preview, on either axis
pub const THUMBNAIL_MAX_SIZE: u32 = 300;

pub const JPEG_QUALITY: u8 = 75;

/// Build an RGB image from a packed RGB24 plane whose rows may be padded
/// out to `stride` bytes
pub fn rgb_image_from_plane(width: u32, height: u32, stride: usize, data: &[u8]) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        anyhow::bail!("Frame has no pixels ({}x{})", width, height);
    }

    let row_len = width as usize * 3;
    if stride < row_len {
        anyhow::bail!("Stride {} shorter than row of {} bytes", stride, row_len);
    }

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in data.chunks(stride).take(height as usize) {
        let row = row
            .get(..row_len)
            .context("Frame plane ended mid-row")?;
        pixels.extend_from_slice(row);
    }

    RgbImage::from_raw(width, height, pixels).context("Frame plane too small for its dimensions")
}

/// Shrink to fit inside a `max_size` square keeping the aspect ratio
///
/// Images already inside the box are returned as-is, never enlarged.
pub fn fit_within(img: DynamicImage, max_size: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_size && height <= max_size {
        return img;
    }

    img.resize(max_size, max_size, image::imageops::FilterType::Lanczos3)
}

/// Bounded JPEG preview of a decoded frame
pub fn encode_thumbnail(img: RgbImage) -> Result<Vec<u8>> {
    let preview = fit_within(DynamicImage::ImageRgb8(img), THUMBNAIL_MAX_SIZE);

    let mut buffer = Vec::new();
    preview
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))
        .context("Failed to encode thumbnail as JPEG")?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_within_keeps_aspect() {
        let wide = DynamicImage::ImageRgb8(RgbImage::new(1920, 1080));
        assert_eq!(fit_within(wide, 300).dimensions(), (300, 169));

        let tall = DynamicImage::ImageRgb8(RgbImage::new(480, 640));
        assert_eq!(fit_within(tall, 300).dimensions(), (225, 300));
    }

    #[test]
    fn test_fit_within_never_enlarges() {
        let small = DynamicImage::ImageRgb8(RgbImage::new(160, 120));
        assert_eq!(fit_within(small, 300).dimensions(), (160, 120));
    }

    #[test]
    fn test_rgb_image_from_padded_plane() {
        // 2x2 image, rows padded to 8 bytes
        let data = [
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        let img = rgb_image_from_plane(2, 2, 8, &data).unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [4, 5, 6]);
        assert_eq!(img.get_pixel(0, 1).0, [7, 8, 9]);
        assert_eq!(img.into_raw().len(), 12);
    }

    #[test]
    fn test_rgb_image_from_short_plane_fails() {
        assert!(rgb_image_from_plane(2, 2, 6, &[0u8; 9]).is_err());
        assert!(rgb_image_from_plane(4, 1, 6, &[0u8; 12]).is_err());
    }

    #[test]
    fn test_encode_thumbnail_is_bounded_jpeg() {
        let frame = RgbImage::from_pixel(640, 360, image::Rgb([200, 40, 40]));
        let jpeg = encode_thumbnail(frame).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (300, 169));
    }
}
