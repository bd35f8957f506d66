//! Error types for storage operations

use http::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Storage settings are missing or unusable
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The upload was rejected before touching the store
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// An object the caller required does not exist
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// AWS SDK error (transport, timeout, dispatch)
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// Image could not be decoded or re-encoded
    #[error("Image processing error: {0}")]
    ImageError(String),
}

impl StorageError {
    /// Whether this error reports a missing object
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound(_))
    }
}

/// Upload rejected by validation, carrying the status the caller should reflect
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UploadError {
    message: String,
    status_code: StatusCode,
}

impl UploadError {
    /// Creates an upload error with a 400 status
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    /// Creates an upload error with an explicit status
    #[must_use]
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }

    /// User-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status code for the HTTP layer
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status_code
    }
}

/// Returns true only for errors that report a missing object
///
/// Deletion and bulk export treat these as already-absent objects; every
/// other failure (permissions, transport, 5xx, validation, configuration)
/// must propagate.
#[must_use]
pub const fn is_not_found_error(error: &StorageError) -> bool {
    error.is_not_found()
}
