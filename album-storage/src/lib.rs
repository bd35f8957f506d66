//! Object storage layer for the album application
//!
//! Uploads of photos and generic files, thumbnail derivation, key naming,
//! public and presigned URLs, and deletion over an S3-compatible bucket.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Storage configuration resolved from the environment
pub mod config;

/// `Content-Disposition` header values
pub mod disposition;

/// Error taxonomy for storage operations
pub mod error;

/// Object key naming
pub mod keys;

/// Upload and retrieval pipelines
pub mod media_storage;

/// Filename generation and MIME heuristics
pub mod naming;

/// Object store abstraction and its S3 implementation
pub mod object_store;

/// Thumbnail derivation
pub mod thumbnail;

pub use config::{ConfigError, StorageConfig};
pub use disposition::{ContentDisposition, DispositionKind};
pub use error::{is_not_found_error, StorageError, StorageResult, UploadError};
pub use keys::KeyBuilder;
pub use media_storage::{FilePreview, MediaStorage, StoredAsset, UploadFile};
pub use naming::guess_mime_from_filename;
pub use object_store::{
    Lookup, ObjectStore, PresignMethod, PresignRequest, PresignedUrl, S3ObjectStore,
};
