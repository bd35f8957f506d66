//! Object store abstraction

/// In-memory store for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
mod s3;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{StorageError, StorageResult};

pub use s3::S3ObjectStore;

/// Outcome of an operation addressed at a key that may not exist
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Lookup<T> {
    /// The object exists
    Found(T),
    /// The key does not exist
    NotFound,
}

impl<T> Lookup<T> {
    /// Whether the key was missing
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Converts into an `Option`, dropping the not-found case
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    /// Requires the object to exist
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ObjectNotFound` carrying `key` if it was missing
    pub fn into_found(self, key: &str) -> StorageResult<T> {
        match self {
            Self::Found(value) => Ok(value),
            Self::NotFound => Err(StorageError::ObjectNotFound(key.to_string())),
        }
    }
}

/// Operation a presigned URL grants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    /// Download the object
    Get,
    /// Upload the object
    Put,
}

/// Parameters signed into a presigned URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    /// Granted operation
    pub method: PresignMethod,
    /// Lifetime of the URL
    pub expires_in: Duration,
    /// For GET the response content type, for PUT the required upload content type
    pub content_type: Option<String>,
    /// Response `Content-Disposition` (GET only)
    pub content_disposition: Option<String>,
    /// Required upload size in bytes (PUT only)
    pub content_length: Option<i64>,
}

impl PresignRequest {
    /// A bare GET request
    #[must_use]
    pub const fn get(expires_in: Duration) -> Self {
        Self {
            method: PresignMethod::Get,
            expires_in,
            content_type: None,
            content_disposition: None,
            content_length: None,
        }
    }

    /// A bare PUT request
    #[must_use]
    pub const fn put(expires_in: Duration) -> Self {
        Self {
            method: PresignMethod::Put,
            expires_in,
            content_type: None,
            content_disposition: None,
            content_length: None,
        }
    }
}

/// Presigned URL with expiration information
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL
    pub url: String,
    /// UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Byte store addressed by string keys inside one bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` under `key`, replacing any existing object
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Reads the whole object at `key`
    async fn get(&self, key: &str) -> StorageResult<Lookup<Vec<u8>>>;

    /// Removes the object at `key`
    ///
    /// Backends that report deletes of missing keys return `Lookup::NotFound`;
    /// others return `Lookup::Found(())` either way.
    async fn delete(&self, key: &str) -> StorageResult<Lookup<()>>;

    /// Signs a time-limited URL for `key` without contacting the store
    async fn presign(&self, key: &str, request: PresignRequest) -> StorageResult<PresignedUrl>;
}
