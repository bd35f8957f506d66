use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use regex::Regex;

/// Encodes a solid-color RGB image in `format`
pub fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .expect("Failed to encode test image");
    buffer.into_inner()
}

/// Dimensions of a WebP image
pub fn webp_dimensions(bytes: &[u8]) -> (u32, u32) {
    image::load_from_memory_with_format(bytes, ImageFormat::WebP)
        .expect("Thumbnail is not a valid WebP image")
        .dimensions()
}

/// Asserts the `{epoch_millis}-{uuid}{ext}` naming scheme
pub fn assert_generated_filename(filename: &str, extension: &str) {
    let pattern = Regex::new(&format!(
        r"^\d{{13,}}-[0-9a-f]{{8}}-[0-9a-f]{{4}}-4[0-9a-f]{{3}}-[89ab][0-9a-f]{{3}}-[0-9a-f]{{12}}{}$",
        regex::escape(extension)
    ))
    .unwrap();

    assert!(
        pattern.is_match(filename),
        "{filename} does not match the generated filename pattern"
    );
}
