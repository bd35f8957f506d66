//! Photo and file storage operations
mod delete;
mod upload;

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use crate::config::StorageConfig;
use crate::disposition::ContentDisposition;
use crate::error::StorageResult;
use crate::keys::KeyBuilder;
use crate::naming::guess_mime_from_filename;
use crate::object_store::{Lookup, ObjectStore, PresignRequest, PresignedUrl};

/// Originals fetched at once while collecting an export
const EXPORT_FETCH_CONCURRENCY: usize = 8;

pub use upload::{
    StoredAsset, UploadFile, ALLOWED_IMAGE_TYPES, MAX_FILE_SIZE, MAX_IMAGE_SIZE,
};

/// File bytes ready to be streamed back for in-browser preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    /// File content
    pub body: Vec<u8>,
    /// `Content-Type` of the response
    pub content_type: String,
    /// `Content-Disposition` of the response, always `inline`
    pub content_disposition: ContentDisposition,
}

/// Storage service for photos, thumbnails and generic files
pub struct MediaStorage {
    store: Arc<dyn ObjectStore>,
    keys: KeyBuilder,
    public_base_url: String,
    presign_expiry: Duration,
}

impl MediaStorage {
    /// Creates the storage service
    ///
    /// # Arguments
    ///
    /// * `store` - Object store holding every asset
    /// * `config` - Resolved storage configuration (prefixes, public URL, presign lifetime)
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: &StorageConfig) -> Self {
        Self {
            store,
            keys: KeyBuilder::from_config(config),
            public_base_url: config.public_base_url.clone(),
            presign_expiry: config.presign_expiry(),
        }
    }

    /// Key builder for the configured prefixes
    #[must_use]
    pub const fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    /// Public URL of an original image
    #[must_use]
    pub fn public_object_url(&self, filename: &str) -> String {
        self.public_url(&self.keys.object_key(filename))
    }

    /// Public URL of an image thumbnail
    #[must_use]
    pub fn public_thumbnail_url(&self, filename: &str) -> String {
        self.public_url(&self.keys.thumbnail_key(filename))
    }

    /// Public URL of a generic file
    #[must_use]
    pub fn public_file_url(&self, filename: &str) -> String {
        self.public_url(&self.keys.file_object_key(filename))
    }

    fn public_url(&self, key: &str) -> String {
        let path = key.trim_start_matches('/');
        if self.public_base_url.is_empty() {
            path.to_string()
        } else {
            format!("{}/{path}", self.public_base_url)
        }
    }

    /// Bytes of an original image
    ///
    /// # Errors
    ///
    /// Returns the store's error for anything but a missing object
    pub async fn original_bytes(&self, filename: &str) -> StorageResult<Lookup<Vec<u8>>> {
        self.store.get(&self.keys.object_key(filename)).await
    }

    /// Bytes of a generic file
    ///
    /// # Errors
    ///
    /// Returns the store's error for anything but a missing object
    pub async fn file_bytes(&self, filename: &str) -> StorageResult<Lookup<Vec<u8>>> {
        self.store.get(&self.keys.file_object_key(filename)).await
    }

    /// Fetches the originals of `filenames` for an export archive
    ///
    /// Up to eight originals are fetched at a time. Missing originals are
    /// skipped; the rest keep the input order.
    ///
    /// # Errors
    ///
    /// Returns the first error that is not a missing object
    #[instrument(skip(self, filenames), fields(count = filenames.len()))]
    pub async fn collect_originals<S>(&self, filenames: &[S]) -> StorageResult<Vec<(String, Vec<u8>)>>
    where
        S: AsRef<str> + Sync,
    {
        let lookups: Vec<Lookup<Vec<u8>>> = stream::iter(filenames)
            .map(|name| self.original_bytes(name.as_ref()))
            .buffered(EXPORT_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        let collected: Vec<(String, Vec<u8>)> = filenames
            .iter()
            .zip(lookups)
            .filter_map(|(name, lookup)| {
                lookup
                    .found()
                    .map(|bytes| (name.as_ref().to_string(), bytes))
            })
            .collect();

        debug!(
            "Collected {} of {} originals",
            collected.len(),
            filenames.len()
        );
        Ok(collected)
    }

    /// File bytes with the headers for an inline preview
    ///
    /// The content type is `mime` when known, otherwise guessed from
    /// `original_name`.
    ///
    /// # Errors
    ///
    /// Returns the store's error for anything but a missing object
    pub async fn file_preview(
        &self,
        filename: &str,
        original_name: &str,
        mime: Option<&str>,
    ) -> StorageResult<Lookup<FilePreview>> {
        let content_type = mime
            .filter(|mime| !mime.is_empty())
            .unwrap_or_else(|| guess_mime_from_filename(original_name))
            .to_string();

        Ok(match self.file_bytes(filename).await? {
            Lookup::Found(body) => Lookup::Found(FilePreview {
                body,
                content_type,
                content_disposition: ContentDisposition::inline().with_filename(original_name),
            }),
            Lookup::NotFound => Lookup::NotFound,
        })
    }

    /// Presigned URL for a direct browser upload to `key`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the presign lifetime is rejected
    /// Returns `StorageError::S3Error` if signing fails
    pub async fn presigned_put_url(
        &self,
        key: &str,
        mime: &str,
        size: Option<i64>,
    ) -> StorageResult<PresignedUrl> {
        let mut request = PresignRequest::put(self.presign_expiry);
        request.content_type = Some(mime.to_string());
        request.content_length = size;

        self.store.presign(key, request).await
    }

    /// Presigned download URL for `key`, forcing a download when named
    ///
    /// # Errors
    ///
    /// Same as [`MediaStorage::presigned_put_url`]
    pub async fn presigned_get_url(
        &self,
        key: &str,
        attachment_name: Option<&str>,
    ) -> StorageResult<PresignedUrl> {
        let mut request = PresignRequest::get(self.presign_expiry);
        request.content_disposition = attachment_name.map(|name| {
            ContentDisposition::attachment()
                .with_filename(name)
                .header_value()
        });

        self.store.presign(key, request).await
    }

    /// Presigned URL previewing a generic file in the browser
    ///
    /// # Errors
    ///
    /// Same as [`MediaStorage::presigned_put_url`]
    pub async fn presigned_inline_file_url(
        &self,
        filename: &str,
        original_name: Option<&str>,
        mime: Option<&str>,
    ) -> StorageResult<PresignedUrl> {
        let disposition = original_name.map_or_else(ContentDisposition::inline, |name| {
            ContentDisposition::inline().with_filename(name)
        });

        let mut request = PresignRequest::get(self.presign_expiry);
        request.content_disposition = Some(disposition.header_value());
        request.content_type = mime.filter(|mime| !mime.is_empty()).map(ToString::to_string);

        self.store
            .presign(&self.keys.file_object_key(filename), request)
            .await
    }

    /// Presigned inline URL for an arbitrary key
    ///
    /// # Errors
    ///
    /// Same as [`MediaStorage::presigned_put_url`]
    pub async fn presigned_inline_url(&self, key: &str) -> StorageResult<PresignedUrl> {
        let mut request = PresignRequest::get(self.presign_expiry);
        request.content_disposition = Some(ContentDisposition::inline().header_value());

        self.store.presign(key, request).await
    }
}
