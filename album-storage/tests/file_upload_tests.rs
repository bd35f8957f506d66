mod common;

use album_storage::{StorageError, UploadFile};
use common::*;
use http::StatusCode;

#[tokio::test]
async fn test_persist_file_stores_single_object() {
    let setup = TestSetup::new();
    let bytes = b"%PDF-1.7 minimal".to_vec();

    let asset = setup
        .media_storage
        .persist_file(UploadFile::new("Quarterly Report.PDF", "application/pdf", bytes.clone()))
        .await
        .expect("Failed to persist file");

    assert_generated_filename(&asset.filename, ".pdf");
    assert_eq!(asset.original_name, "Quarterly Report.PDF");
    assert_eq!(setup.store.keys().await, vec![format!("files/{}", asset.filename)]);

    let stored = setup
        .store
        .object(&format!("files/{}", asset.filename))
        .await
        .unwrap();
    assert_eq!(stored.content_type, "application/pdf");
    assert_eq!(sha256_hex(&stored.body), sha256_hex(&bytes));
}

#[tokio::test]
async fn test_persist_file_without_type_uses_octet_stream() {
    let setup = TestSetup::new();

    let asset = setup
        .media_storage
        .persist_file(UploadFile::new("dump.bin", "", vec![1, 2, 3]))
        .await
        .unwrap();

    let stored = setup
        .store
        .object(&setup.media_storage.keys().file_object_key(&asset.filename))
        .await
        .unwrap();
    assert_eq!(stored.content_type, "application/octet-stream");
}

#[tokio::test]
async fn test_persist_file_extension_ignores_mime() {
    let setup = TestSetup::new();

    let asset = setup
        .media_storage
        .persist_file(UploadFile::new("Makefile", "image/png", vec![0; 8]))
        .await
        .unwrap();

    assert_generated_filename(&asset.filename, "");
}

#[tokio::test]
async fn test_persist_file_accepts_any_type() {
    let setup = TestSetup::new();

    for (name, content_type) in [
        ("model.stl", "model/stl"),
        ("archive.tar.gz", "application/gzip"),
        ("vector.svg", "image/svg+xml"),
    ] {
        assert!(setup
            .media_storage
            .persist_file(UploadFile::new(name, content_type, vec![0; 32]))
            .await
            .is_ok());
    }
    assert_eq!(setup.store.len().await, 3);
}

#[tokio::test]
async fn test_round_trip_through_file_bytes() {
    let setup = TestSetup::new();
    let bytes = (0..=255u8).cycle().take(70_000).collect::<Vec<_>>();

    let asset = setup
        .media_storage
        .persist_file(UploadFile::new("blob.dat", "application/octet-stream", bytes.clone()))
        .await
        .unwrap();

    let stored = setup
        .media_storage
        .file_bytes(&asset.filename)
        .await
        .unwrap()
        .into_found(&asset.filename)
        .unwrap();
    assert_eq!(stored, bytes);
}

#[tokio::test]
async fn test_persist_file_rejects_oversized_file() {
    let setup = TestSetup::new();
    let bytes = vec![0u8; 512 * 1024 * 1024 + 1];

    let error = setup
        .media_storage
        .persist_file(UploadFile::new("disk.img", "application/octet-stream", bytes))
        .await
        .unwrap_err();

    match error {
        StorageError::Upload(upload_error) => {
            assert_eq!(upload_error.status_code(), StatusCode::BAD_REQUEST);
            assert!(upload_error.message().contains("512MB"));
        }
        other => panic!("Expected upload error, got {other:?}"),
    }
    assert!(setup.store.is_empty().await);
}

#[tokio::test]
async fn test_persist_file_propagates_store_errors() {
    let setup = TestSetup::new();
    setup.store.fail_puts_under("files/").await;

    let error = setup
        .media_storage
        .persist_file(UploadFile::new("a.txt", "text/plain", b"hi".to_vec()))
        .await
        .unwrap_err();

    assert!(matches!(error, StorageError::S3Error(_)));
    assert!(!album_storage::is_not_found_error(&error));
}
