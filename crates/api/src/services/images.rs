//! User photo pipeline.
//!
//! Accepts an in-memory upload (image MIME only, capped at 2 MiB by the
//! route layer), resizes it to a fixed square, re-encodes it as JPEG and
//! persists it under the configured upload directory. Returns the stored
//! filename for the profile record.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

use petal_core::UserId;

/// Output square edge length in pixels.
const PHOTO_EDGE: u32 = 500;
/// JPEG re-encode quality.
const JPEG_QUALITY: u8 = 90;
/// Maximum accepted upload size.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Errors from the photo pipeline.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The upload exceeds the size cap.
    #[error("image exceeds the {MAX_UPLOAD_BYTES} byte limit")]
    TooLarge,

    /// The payload did not decode as an image.
    #[error("not an image, please upload only images")]
    Decode(#[from] image::ImageError),

    /// Writing the processed file failed.
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),

    /// The processing task was cancelled.
    #[error("image processing task failed")]
    TaskFailed,
}

/// Resize, re-encode and persist a user photo.
///
/// Pixel work runs on the blocking pool; the file lands at
/// `{upload_dir}/user-{user_id}-{suffix}.jpeg` and that filename is returned.
///
/// # Errors
///
/// Returns `ImageError::TooLarge` for oversized uploads, `Decode` for
/// non-image payloads and `Io` if the file cannot be written.
pub async fn process_user_photo(
    bytes: Vec<u8>,
    upload_dir: &Path,
    user_id: UserId,
) -> Result<String, ImageError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ImageError::TooLarge);
    }

    let encoded = tokio::task::spawn_blocking(move || resize_to_square_jpeg(&bytes))
        .await
        .map_err(|_| ImageError::TaskFailed)??;

    let filename = format!("user-{user_id}-{}.jpeg", uuid::Uuid::new_v4());

    tokio::fs::create_dir_all(upload_dir).await?;
    tokio::fs::write(upload_dir.join(&filename), encoded).await?;

    Ok(filename)
}

/// Decode, resize to the fixed square and re-encode as JPEG.
fn resize_to_square_jpeg(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(PHOTO_EDGE, PHOTO_EDGE, FilterType::Lanczos3);

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;

    Ok(out.into_inner())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([180, 120, 200]),
        ));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_resize_produces_fixed_square_jpeg() {
        let png = sample_png(120, 80);
        let jpeg = resize_to_square_jpeg(&png).unwrap();

        let round_trip = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(round_trip.width(), PHOTO_EDGE);
        assert_eq!(round_trip.height(), PHOTO_EDGE);
        assert_eq!(
            image::guess_format(&jpeg).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_garbage_payload_is_rejected() {
        let result = resize_to_square_jpeg(b"definitely not an image");
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let dir = std::env::temp_dir();
        let huge = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let result = process_user_photo(huge, &dir, UserId::generate()).await;
        assert!(matches!(result, Err(ImageError::TooLarge)));
    }

    #[tokio::test]
    async fn test_photo_is_persisted_under_upload_dir() {
        let dir = std::env::temp_dir().join("petal-image-test");
        let png = sample_png(64, 64);

        let filename = process_user_photo(png, &dir, UserId::generate())
            .await
            .unwrap();
        assert!(filename.starts_with("user-"));
        assert!(filename.ends_with(".jpeg"));

        let stored = tokio::fs::read(dir.join(&filename)).await.unwrap();
        assert!(!stored.is_empty());

        let _ = tokio::fs::remove_file(dir.join(&filename)).await;
    }
}
