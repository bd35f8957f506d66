//! WebP thumbnails for uploaded images

use image::{DynamicImage, GenericImageView};

use crate::error::{StorageError, StorageResult};

/// Bounding box the thumbnail must fit in
pub const THUMBNAIL_MAX_DIMENSION: u32 = 400;

/// WebP quality of thumbnails
pub const THUMBNAIL_QUALITY: f32 = 80.0;

/// Content type of every thumbnail
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/webp";

/// Decodes `bytes` and returns a WebP thumbnail that fits in 400x400
///
/// The aspect ratio is preserved and images already inside the box are
/// never enlarged. Animated inputs keep only their first frame.
///
/// # Errors
///
/// Returns `StorageError::ImageError` if the input cannot be decoded or the
/// thumbnail cannot be encoded
pub fn render_thumbnail(bytes: &[u8]) -> StorageResult<Vec<u8>> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| StorageError::ImageError(format!("Failed to decode image: {e}")))?;

    let (width, height) = image.dimensions();
    let resized = if width > THUMBNAIL_MAX_DIMENSION || height > THUMBNAIL_MAX_DIMENSION {
        image.thumbnail(THUMBNAIL_MAX_DIMENSION, THUMBNAIL_MAX_DIMENSION)
    } else {
        image
    };

    // libwebp only accepts 8-bit RGB and RGBA buffers
    let encodable = if resized.color().has_alpha() {
        DynamicImage::ImageRgba8(resized.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(resized.to_rgb8())
    };

    let encoder = webp::Encoder::from_image(&encodable)
        .map_err(|e| StorageError::ImageError(format!("Failed to prepare WebP encoder: {e}")))?;

    Ok(encoder.encode(THUMBNAIL_QUALITY).to_vec())
}
