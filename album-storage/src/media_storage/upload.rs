//! Upload pipelines for images and generic files

use futures::future::join;
use tracing::{error, info, instrument, warn};

use super::MediaStorage;
use crate::error::{StorageError, StorageResult, UploadError};
use crate::naming::{
    generate_filename, resolve_extension, FILE_EXTENSION_SOURCES, IMAGE_EXTENSION_SOURCES,
};
use crate::thumbnail::{render_thumbnail, THUMBNAIL_CONTENT_TYPE};

/// Image types accepted by [`MediaStorage::persist_image`]
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Largest accepted image: 10 MiB
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Largest accepted generic file: 512 MiB
pub const MAX_FILE_SIZE: usize = 512 * 1024 * 1024;

/// A file received from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Filename supplied by the user
    pub name: String,
    /// Declared MIME type, possibly empty
    pub content_type: String,
    /// File content
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Creates an upload from its parts
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Identifiers of a stored upload, for the caller to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Generated storage filename, `{epoch_millis}-{uuid}{ext}`
    pub filename: String,
    /// Filename the user uploaded, verbatim
    pub original_name: String,
}

impl MediaStorage {
    /// Stores an image together with its WebP thumbnail
    ///
    /// Both objects are uploaded concurrently. When only one of them lands,
    /// it is deleted again so that a failed call leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Upload` (400) for unsupported types or images over 10 MiB
    /// Returns `StorageError::ImageError` if the image cannot be decoded
    /// Returns the store's error if either upload fails
    #[instrument(skip(self, file), fields(original_name = %file.name, size = file.size()))]
    pub async fn persist_image(&self, file: UploadFile) -> StorageResult<StoredAsset> {
        let canonical_type = validate_image(&file)?;

        let extension = resolve_extension(IMAGE_EXTENSION_SOURCES, &file.name, canonical_type);
        let filename = generate_filename(&extension);
        let UploadFile {
            name,
            content_type,
            bytes,
        } = file;

        let (bytes, thumbnail) = tokio::task::spawn_blocking(move || {
            let thumbnail = render_thumbnail(&bytes);
            (bytes, thumbnail)
        })
        .await
        .map_err(|e| StorageError::ImageError(format!("Thumbnail task failed: {e}")))?;
        let thumbnail = thumbnail?;

        let object_key = self.keys.object_key(&filename);
        let thumbnail_key = self.keys.thumbnail_key(&filename);

        let (original_result, thumbnail_result) = join(
            self.store.put(&object_key, bytes, &content_type),
            self.store
                .put(&thumbnail_key, thumbnail, THUMBNAIL_CONTENT_TYPE),
        )
        .await;

        match (original_result, thumbnail_result) {
            (Ok(()), Ok(())) => {}
            (Err(e), Ok(())) => {
                self.discard_partial_upload(&thumbnail_key).await;
                return Err(e);
            }
            (Ok(()), Err(e)) => {
                self.discard_partial_upload(&object_key).await;
                return Err(e);
            }
            (Err(e), Err(_)) => return Err(e),
        }

        info!("Stored image {} with thumbnail", filename);

        Ok(StoredAsset {
            filename,
            original_name: name,
        })
    }

    /// Stores a generic file
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Upload` (400) for files over 512 MiB
    /// Returns the store's error if the upload fails
    #[instrument(skip(self, file), fields(original_name = %file.name, size = file.size()))]
    pub async fn persist_file(&self, file: UploadFile) -> StorageResult<StoredAsset> {
        if file.size() > MAX_FILE_SIZE {
            return Err(UploadError::bad_request(format!(
                "File size exceeds the limit ({}MB)",
                MAX_FILE_SIZE / 1024 / 1024
            ))
            .into());
        }

        let extension = resolve_extension(FILE_EXTENSION_SOURCES, &file.name, &file.content_type);
        let filename = generate_filename(&extension);
        let UploadFile {
            name,
            content_type,
            bytes,
        } = file;

        let content_type = if content_type.trim().is_empty() {
            mime::APPLICATION_OCTET_STREAM.to_string()
        } else {
            content_type
        };

        self.store
            .put(&self.keys.file_object_key(&filename), bytes, &content_type)
            .await?;

        info!("Stored file {}", filename);

        Ok(StoredAsset {
            filename,
            original_name: name,
        })
    }

    async fn discard_partial_upload(&self, key: &str) {
        match self.store.delete(key).await {
            Ok(_) => warn!("Removed {} after a partial image upload", key),
            Err(e) => error!("Failed to remove {} after a partial image upload: {}", key, e),
        }
    }
}

/// Checks type and size, returning the canonical image MIME type used to
/// pick the extension
fn validate_image(file: &UploadFile) -> Result<&'static str, UploadError> {
    let content_type = file
        .content_type
        .parse::<mime::Mime>()
        .ok()
        .and_then(|parsed| {
            ALLOWED_IMAGE_TYPES
                .iter()
                .find(|allowed| parsed.essence_str().eq_ignore_ascii_case(allowed))
                .copied()
        })
        .ok_or_else(|| UploadError::bad_request("Only JPG/PNG/GIF/WebP images are supported"))?;

    if file.size() > MAX_IMAGE_SIZE {
        return Err(UploadError::bad_request(format!(
            "File size exceeds the limit ({}MB)",
            MAX_IMAGE_SIZE / 1024 / 1024
        )));
    }

    Ok(content_type)
}
