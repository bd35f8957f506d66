//! S3-compatible object store

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::{
    config::Credentials,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client as S3Client,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::{Lookup, ObjectStore, PresignMethod, PresignRequest, PresignedUrl};
use crate::config::{ConfigError, StorageConfig};
use crate::error::{StorageError, StorageResult};

const MAX_RETRIES: u32 = 3;
const OPERATION_TIMEOUT_SECS: u64 = 30;
const NO_SUCH_KEY: &str = "NoSuchKey";
const CREDENTIALS_PROVIDER: &str = "album-storage";

/// Object store backed by an S3-compatible service
pub struct S3ObjectStore {
    client: S3Client,
    bucket_name: String,
}

impl S3ObjectStore {
    /// Builds the S3 client from the storage configuration
    ///
    /// Uses the configured static credentials, region and endpoint with a
    /// standard retry policy and a 30 second operation timeout.
    pub async fn new(config: &StorageConfig) -> Self {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(MAX_RETRIES)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(OPERATION_TIMEOUT_SECS))
            .build();

        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.clone())
            .credentials_provider(credentials)
            .retry_config(retry_config)
            .timeout_config(timeout_config)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        info!(
            "Initialized S3 object store for bucket: {} at {} with {} max retries",
            config.bucket, config.endpoint, MAX_RETRIES
        );

        Self::from_client(S3Client::from_conf(s3_config), config.bucket.clone())
    }

    /// Wraps an already configured client
    #[must_use]
    pub const fn from_client(client: S3Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }

    /// Name of the bucket every key lives in
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()> {
        debug!("Putting object: {} ({} bytes, {})", key, body.len(), content_type);

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| map_sdk_error("put", key, &e))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Lookup<Vec<u8>>> {
        debug!("Getting object: {}", key);

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if is_no_such_key(&e) => {
                debug!("Object does not exist: {}", key);
                return Ok(Lookup::NotFound);
            }
            Err(e) => return Err(map_sdk_error("get", key, &e)),
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::AwsError(format!("Failed to read body of {key}: {e}")))?;

        Ok(Lookup::Found(body.into_bytes().to_vec()))
    }

    async fn delete(&self, key: &str) -> StorageResult<Lookup<()>> {
        debug!("Deleting object: {}", key);

        match self
            .client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(Lookup::Found(())),
            Err(e) if is_no_such_key(&e) => Ok(Lookup::NotFound),
            Err(e) => Err(map_sdk_error("delete", key, &e)),
        }
    }

    async fn presign(&self, key: &str, request: PresignRequest) -> StorageResult<PresignedUrl> {
        debug!(
            "Generating presigned {:?} URL for object: {} expiring in {:?}",
            request.method, key, request.expires_in
        );

        let presigning_config = PresigningConfig::expires_in(request.expires_in).map_err(|e| {
            StorageError::Config(ConfigError::Invalid {
                name: "presign expiry",
                reason: e.to_string(),
            })
        })?;

        let presigned = match request.method {
            PresignMethod::Get => self
                .client
                .get_object()
                .bucket(&self.bucket_name)
                .key(key)
                .set_response_content_type(request.content_type)
                .set_response_content_disposition(request.content_disposition)
                .presigned(presigning_config)
                .await
                .map_err(|e| map_sdk_error("presign get", key, &e))?,
            PresignMethod::Put => self
                .client
                .put_object()
                .bucket(&self.bucket_name)
                .key(key)
                .set_content_type(request.content_type)
                .set_content_length(request.content_length)
                .presigned(presigning_config)
                .await
                .map_err(|e| map_sdk_error("presign put", key, &e))?,
        };

        let expires_at: DateTime<Utc> = Utc::now() + request.expires_in;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            expires_at,
        })
    }
}

/// Whether the service reported the key as missing
fn is_no_such_key<E: ProvideErrorMetadata>(error: &SdkError<E>) -> bool {
    matches!(error, SdkError::ServiceError(service_err) if service_err.err().code() == Some(NO_SUCH_KEY))
}

fn map_sdk_error<E>(operation: &str, key: &str, error: &SdkError<E>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match error {
        SdkError::ServiceError(service_err) if service_err.raw().status().as_u16() >= 500 => {
            error!("Upstream error during {} of {}: {}", operation, key, DisplayErrorContext(error));
            StorageError::UpstreamError(format!("{operation} {key}: {}", DisplayErrorContext(error)))
        }
        SdkError::ServiceError(service_err) => {
            error!("Failed to {} {}: {}", operation, key, DisplayErrorContext(error));
            StorageError::S3Error(format!(
                "{operation} {key}: {}",
                service_err.err().code().unwrap_or("unknown")
            ))
        }
        _ => {
            error!("Failed to {} {}: {}", operation, key, DisplayErrorContext(error));
            StorageError::AwsError(format!("{operation} {key}: {}", DisplayErrorContext(error)))
        }
    }
}
