//! In-memory object store for tests

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tokio::sync::RwLock;

use super::{Lookup, ObjectStore, PresignMethod, PresignRequest, PresignedUrl};
use crate::error::{StorageError, StorageResult};

/// Stored object with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object bytes
    pub body: Vec<u8>,
    /// Content type given on upload
    pub content_type: String,
}

/// Object store keeping everything in a map
///
/// Deleting a missing key reports `Lookup::NotFound`, like stores that
/// answer such deletes with `NoSuchKey`. Puts and deletes can be made to
/// fail for keys under chosen prefixes.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    bucket_name: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    failing_put_prefixes: RwLock<HashSet<String>>,
    failing_delete_prefixes: RwLock<HashSet<String>>,
}

impl MemoryObjectStore {
    /// Creates an empty store
    #[must_use]
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            ..Self::default()
        }
    }

    /// Makes every put under `prefix` fail with an S3 error
    pub async fn fail_puts_under(&self, prefix: impl Into<String>) {
        self.failing_put_prefixes.write().await.insert(prefix.into());
    }

    /// Makes every delete under `prefix` fail with an S3 error
    pub async fn fail_deletes_under(&self, prefix: impl Into<String>) {
        self.failing_delete_prefixes
            .write()
            .await
            .insert(prefix.into());
    }

    /// Stops injecting failures
    pub async fn clear_failures(&self) {
        self.failing_put_prefixes.write().await.clear();
        self.failing_delete_prefixes.write().await.clear();
    }

    /// Object stored at `key`, if any
    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// All keys in lexicographic order
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store holds no objects
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    async fn injected_failure(
        prefixes: &RwLock<HashSet<String>>,
        operation: &str,
        key: &str,
    ) -> StorageResult<()> {
        if prefixes
            .read()
            .await
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
        {
            return Err(StorageError::S3Error(format!(
                "{operation} {key}: InternalError (injected)"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()> {
        Self::injected_failure(&self.failing_put_prefixes, "put", key).await?;

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Lookup<Vec<u8>>> {
        Ok(self
            .objects
            .read()
            .await
            .get(key)
            .map_or(Lookup::NotFound, |object| Lookup::Found(object.body.clone())))
    }

    async fn delete(&self, key: &str) -> StorageResult<Lookup<()>> {
        Self::injected_failure(&self.failing_delete_prefixes, "delete", key).await?;

        Ok(self
            .objects
            .write()
            .await
            .remove(key)
            .map_or(Lookup::NotFound, |_| Lookup::Found(())))
    }

    async fn presign(&self, key: &str, request: PresignRequest) -> StorageResult<PresignedUrl> {
        let method = match request.method {
            PresignMethod::Get => "GET",
            PresignMethod::Put => "PUT",
        };

        let mut url = format!(
            "memory://{}/{key}?method={method}&expires={}",
            self.bucket_name,
            request.expires_in.as_secs()
        );
        let optional = [
            ("content-type", request.content_type),
            ("content-disposition", request.content_disposition),
            ("content-length", request.content_length.map(|len| len.to_string())),
        ];
        for (name, value) in optional
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value)))
        {
            url.push_str(&format!(
                "&{name}={}",
                utf8_percent_encode(&value, NON_ALPHANUMERIC)
            ));
        }

        Ok(PresignedUrl {
            url,
            expires_at: Utc::now() + request.expires_in,
        })
    }
}
