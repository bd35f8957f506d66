//! Storage filename generation and MIME heuristics

use chrono::Utc;
use uuid::Uuid;

/// Where an upload's extension may come from
///
/// Resolution walks an ordered list of sources and stops at the first one
/// yielding a non-empty extension. Every source is total: it returns an
/// empty string rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionSource {
    /// Last dot-separated segment of the user-supplied filename
    OriginalName,
    /// Canonical extension of a supported image MIME type
    MimeType,
}

/// Extension order for images: filename first, then the MIME type
pub const IMAGE_EXTENSION_SOURCES: &[ExtensionSource] =
    &[ExtensionSource::OriginalName, ExtensionSource::MimeType];

/// Extension order for generic files: filename only
pub const FILE_EXTENSION_SOURCES: &[ExtensionSource] = &[ExtensionSource::OriginalName];

impl ExtensionSource {
    /// Extension with leading dot, lowercased, or an empty string
    #[must_use]
    pub fn extension(self, original_name: &str, content_type: &str) -> String {
        match self {
            Self::OriginalName => extension_from_name(original_name),
            Self::MimeType => extension_from_mime(content_type).to_string(),
        }
    }
}

/// Resolves an extension by trying `sources` in order
#[must_use]
pub fn resolve_extension(
    sources: &[ExtensionSource],
    original_name: &str,
    content_type: &str,
) -> String {
    sources
        .iter()
        .map(|source| source.extension(original_name, content_type))
        .find(|extension| !extension.is_empty())
        .unwrap_or_default()
}

/// Generates a fresh storage filename: `{epoch_millis}-{uuid}{extension}`
#[must_use]
pub fn generate_filename(extension: &str) -> String {
    format!(
        "{}-{}{extension}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4()
    )
}

/// Best-effort MIME type for a filename, `application/octet-stream` when unknown
#[must_use]
pub fn guess_mime_from_filename(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let table: &[(&[&str], &'static str)] = &[
        (&[".pdf"], "application/pdf"),
        (&[".png"], "image/png"),
        (&[".jpg", ".jpeg"], "image/jpeg"),
        (&[".gif"], "image/gif"),
        (&[".webp"], "image/webp"),
        (&[".txt"], "text/plain"),
        (&[".md"], "text/markdown"),
    ];

    table
        .iter()
        .find(|(suffixes, _)| suffixes.iter().any(|suffix| lower.ends_with(suffix)))
        .map_or("application/octet-stream", |(_, mime)| *mime)
}

fn extension_from_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, extension)) if !extension.is_empty() => {
            format!(".{}", extension.to_lowercase())
        }
        _ => String::new(),
    }
}

fn extension_from_mime(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_name() {
        assert_eq!(extension_from_name("photo.JPG"), ".jpg");
        assert_eq!(extension_from_name("archive.tar.gz"), ".gz");
        assert_eq!(extension_from_name("README"), "");
        assert_eq!(extension_from_name("trailing."), "");
        assert_eq!(extension_from_name(""), "");
    }

    #[test]
    fn test_image_sources_fall_back_to_mime() {
        assert_eq!(
            resolve_extension(IMAGE_EXTENSION_SOURCES, "photo.JPG", "image/jpeg"),
            ".jpg"
        );
        assert_eq!(
            resolve_extension(IMAGE_EXTENSION_SOURCES, "blob", "image/webp"),
            ".webp"
        );
        assert_eq!(
            resolve_extension(IMAGE_EXTENSION_SOURCES, "blob", "image/tiff"),
            ""
        );
    }

    #[test]
    fn test_file_sources_ignore_mime() {
        assert_eq!(
            resolve_extension(FILE_EXTENSION_SOURCES, "notes", "image/png"),
            ""
        );
        assert_eq!(
            resolve_extension(FILE_EXTENSION_SOURCES, "Report.PDF", "application/pdf"),
            ".pdf"
        );
    }

    #[test]
    fn test_generated_filenames_are_unique() {
        let first = generate_filename(".png");
        let second = generate_filename(".png");

        assert_ne!(first, second);
        assert!(first.ends_with(".png"));

        let (millis, rest) = first.split_once('-').unwrap();
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
        assert!(Uuid::parse_str(rest.trim_end_matches(".png")).is_ok());
    }

    #[test]
    fn test_guess_mime_from_filename() {
        assert_eq!(guess_mime_from_filename("Scan.PDF"), "application/pdf");
        assert_eq!(guess_mime_from_filename("a.jpeg"), "image/jpeg");
        assert_eq!(guess_mime_from_filename("a.jpg"), "image/jpeg");
        assert_eq!(guess_mime_from_filename("notes.md"), "text/markdown");
        assert_eq!(guess_mime_from_filename("notes.txt"), "text/plain");
        assert_eq!(guess_mime_from_filename("data.bin"), "application/octet-stream");
        assert_eq!(guess_mime_from_filename(""), "application/octet-stream");
    }
}
