use std::collections::HashMap;
use std::sync::Arc;

use album_storage::{
    object_store::memory::MemoryObjectStore, MediaStorage, S3ObjectStore, StorageConfig,
};
use sha2::{Digest, Sha256};

pub const TEST_BUCKET: &str = "album-test";
pub const PUBLIC_BASE_URL: &str = "https://cdn.example.com";

/// Setup test environment variables and tracing
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Configuration pointing at LocalStack, independent of the process environment
pub fn test_config(overrides: &[(&str, &str)]) -> StorageConfig {
    let mut vars: HashMap<String, String> = [
        ("STORAGE_ACCESS_KEY_ID", "AKIDTESTKEY"),
        ("STORAGE_SECRET_ACCESS_KEY", "test-secret"),
        ("STORAGE_REGION", "us-east-1"),
        ("STORAGE_ENDPOINT", "http://localhost:4566"),
        ("STORAGE_BUCKET", TEST_BUCKET),
        ("STORAGE_PUBLIC_BASE_URL", PUBLIC_BASE_URL),
        ("STORAGE_FORCE_PATH_STYLE", "true"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect();

    for (name, value) in overrides {
        vars.insert((*name).to_string(), (*value).to_string());
    }

    StorageConfig::from_lookup(|name| vars.get(name).cloned()).expect("test config is valid")
}

/// Media storage over an in-memory store
pub struct TestSetup {
    pub config: StorageConfig,
    pub store: Arc<MemoryObjectStore>,
    pub media_storage: MediaStorage,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_overrides(&[])
    }

    pub fn with_overrides(overrides: &[(&str, &str)]) -> Self {
        setup_test_env();

        let config = test_config(overrides);
        let store = Arc::new(MemoryObjectStore::new(TEST_BUCKET));
        let media_storage = MediaStorage::new(store.clone(), &config);

        Self {
            config,
            store,
            media_storage,
        }
    }
}

/// Media storage over the real S3 client; signing works offline
pub async fn s3_media_storage(overrides: &[(&str, &str)]) -> (StorageConfig, MediaStorage) {
    setup_test_env();

    let config = test_config(overrides);
    let store = Arc::new(S3ObjectStore::new(&config).await);
    let media_storage = MediaStorage::new(store, &config);

    (config, media_storage)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
