//! Deletion of stored assets

use futures::future::join_all;
use tracing::{debug, instrument};

use super::MediaStorage;
use crate::error::{StorageError, StorageResult};

impl MediaStorage {
    /// Deletes an original image and its thumbnail
    ///
    /// Missing objects count as deleted, so the call is idempotent and safe
    /// after a partial upload.
    ///
    /// # Errors
    ///
    /// Returns the first store error that is not a missing object
    #[instrument(skip(self))]
    pub async fn delete_image_assets(&self, filename: &str) -> StorageResult<()> {
        self.delete_keys(&[
            self.keys.object_key(filename),
            self.keys.thumbnail_key(filename),
        ])
        .await
    }

    /// Deletes a generic file
    ///
    /// # Errors
    ///
    /// Returns the store error if it is not a missing object
    #[instrument(skip(self))]
    pub async fn delete_file_asset(&self, filename: &str) -> StorageResult<()> {
        self.delete_keys(&[self.keys.file_object_key(filename)])
            .await
    }

    /// Deletes several images with their thumbnails at once
    ///
    /// # Errors
    ///
    /// Returns the first store error that is not a missing object, after
    /// every delete has finished
    #[instrument(skip(self, filenames), fields(count = filenames.len()))]
    pub async fn delete_image_assets_batch<S>(&self, filenames: &[S]) -> StorageResult<()>
    where
        S: AsRef<str> + Sync,
    {
        let keys: Vec<String> = filenames
            .iter()
            .flat_map(|filename| {
                [
                    self.keys.object_key(filename.as_ref()),
                    self.keys.thumbnail_key(filename.as_ref()),
                ]
            })
            .collect();

        self.delete_keys(&keys).await
    }

    /// Deletes several generic files at once
    ///
    /// # Errors
    ///
    /// Same as [`MediaStorage::delete_image_assets_batch`]
    #[instrument(skip(self, filenames), fields(count = filenames.len()))]
    pub async fn delete_file_assets_batch<S>(&self, filenames: &[S]) -> StorageResult<()>
    where
        S: AsRef<str> + Sync,
    {
        let keys: Vec<String> = filenames
            .iter()
            .map(|filename| self.keys.file_object_key(filename.as_ref()))
            .collect();

        self.delete_keys(&keys).await
    }

    async fn delete_keys(&self, keys: &[String]) -> StorageResult<()> {
        let results = join_all(keys.iter().map(|key| async move {
            if self.store.delete(key).await?.is_not_found() {
                debug!("Object already absent: {}", key);
            }
            Ok::<(), StorageError>(())
        }))
        .await;

        results.into_iter().collect()
    }
}
