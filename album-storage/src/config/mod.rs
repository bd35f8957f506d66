//! Storage configuration resolved once at startup

mod error;

use std::env;
use std::fmt;
use std::time::Duration;

pub use error::ConfigError;

/// Default presigned URL lifetime: 15 minutes
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 15 * 60;

/// Longest lifetime a SigV4 presigned URL may carry: 7 days
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

const DEFAULT_UPLOAD_PREFIX: &str = "uploads/";
const DEFAULT_FILES_PREFIX: &str = "files/";

const ACCESS_KEY_ID: &str = "STORAGE_ACCESS_KEY_ID";
const SECRET_ACCESS_KEY: &str = "STORAGE_SECRET_ACCESS_KEY";
const REGION: &str = "STORAGE_REGION";
const ENDPOINT: &str = "STORAGE_ENDPOINT";
const BUCKET: &str = "STORAGE_BUCKET";
const PUBLIC_BASE_URL: &str = "STORAGE_PUBLIC_BASE_URL";
const UPLOAD_PREFIX: &str = "STORAGE_UPLOAD_PREFIX";
const THUMBNAIL_PREFIX: &str = "STORAGE_THUMBNAIL_PREFIX";
const FILES_PREFIX: &str = "STORAGE_FILES_PREFIX";
const PRESIGN_EXPIRES: &str = "STORAGE_PRESIGN_EXPIRES";
const FORCE_PATH_STYLE: &str = "STORAGE_FORCE_PATH_STYLE";

/// Credentials, bucket location and key layout for the object store
///
/// Built once when the application starts and shared from there; nothing
/// re-reads the environment afterwards, so rotating credentials requires a
/// restart.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Signing region
    pub region: String,
    /// Endpoint URL, always with a scheme
    pub endpoint: String,
    /// Bucket holding every object
    pub bucket: String,
    /// Prefix for original images
    pub upload_prefix: String,
    /// Prefix for image thumbnails
    pub thumbnail_prefix: String,
    /// Prefix for generic files
    pub files_prefix: String,
    /// Base of public object links, without trailing slash
    pub public_base_url: String,
    /// Lifetime of presigned URLs in seconds
    pub presign_expiry_secs: u64,
    /// Use path-style bucket addressing (`LocalStack`, `MinIO`)
    pub force_path_style: bool,
}

impl StorageConfig {
    /// Reads the configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if a required variable is unset or blank
    /// Returns `ConfigError::Invalid` if the presign lifetime exceeds 7 days
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`StorageConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let access_key_id = required(ACCESS_KEY_ID)?;
        let secret_access_key = required(SECRET_ACCESS_KEY)?;
        let region = required(REGION)?;
        let endpoint = normalize_endpoint(&required(ENDPOINT)?);
        let bucket = required(BUCKET)?;
        let public_base_url = normalize_base_url(&required(PUBLIC_BASE_URL)?);

        let upload_prefix = normalize_prefix(
            &lookup(UPLOAD_PREFIX).unwrap_or_else(|| DEFAULT_UPLOAD_PREFIX.to_string()),
        );
        let thumbnail_prefix = normalize_prefix(
            &lookup(THUMBNAIL_PREFIX).unwrap_or_else(|| format!("{upload_prefix}thumbnails/")),
        );
        let files_prefix = normalize_prefix(
            &lookup(FILES_PREFIX).unwrap_or_else(|| DEFAULT_FILES_PREFIX.to_string()),
        );

        let presign_expiry_secs = parse_presign_expiry(lookup(PRESIGN_EXPIRES).as_deref())?;

        let force_path_style = lookup(FORCE_PATH_STYLE).is_some_and(|value| {
            matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
        });

        Ok(Self {
            access_key_id,
            secret_access_key,
            region,
            endpoint,
            bucket,
            upload_prefix,
            thumbnail_prefix,
            files_prefix,
            public_base_url,
            presign_expiry_secs,
            force_path_style,
        })
    }

    /// Presigned URL lifetime as a `Duration`
    #[must_use]
    pub const fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("upload_prefix", &self.upload_prefix)
            .field("thumbnail_prefix", &self.thumbnail_prefix)
            .field("files_prefix", &self.files_prefix)
            .field("public_base_url", &self.public_base_url)
            .field("presign_expiry_secs", &self.presign_expiry_secs)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Strips leading slashes and leaves exactly one trailing slash.
/// A blank prefix stays blank and addresses the bucket root.
fn normalize_prefix(input: &str) -> String {
    let trimmed = input.trim().trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

fn normalize_base_url(input: &str) -> String {
    input.trim().trim_end_matches('/').to_string()
}

fn normalize_endpoint(input: &str) -> String {
    if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{input}")
    }
}

fn parse_presign_expiry(raw: Option<&str>) -> Result<u64, ConfigError> {
    let secs = raw
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS);

    if secs > MAX_PRESIGN_EXPIRY_SECS {
        return Err(ConfigError::Invalid {
            name: PRESIGN_EXPIRES,
            reason: format!("{secs} seconds exceeds the {MAX_PRESIGN_EXPIRY_SECS} second maximum"),
        });
    }

    Ok(secs)
}
