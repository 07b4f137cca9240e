use crate::{
    AudioBlob, CoreError, RecordingRecord, UPLOAD_FIELD, UploadClient,
    tests::support::{FakeStore, endpoint, unreachable_base_url},
};

use serde_json::json;

fn blob() -> AudioBlob {
    AudioBlob::new(b"OggS-test-bytes".to_vec(), "audio/ogg", "ogg", 0)
}

/// WHAT: Upload sends one multipart part under the recognized field name
/// WHY: The store only reads the `recording` field
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_blob_when_uploading_then_single_part_with_field_filename_and_type() {
    // Given: A store and an upload client
    let (store, base_url) = FakeStore::spawn().await;
    store.respond_to_upload_with(json!({ "_id": "r1", "path": "r1.webm" }));
    let client = UploadClient::new(endpoint(&base_url));

    // When: Uploading a blob
    let record = client.upload(&blob()).await.unwrap();

    // Then: The store got exactly one part with the blob's name, type, and bytes
    let uploads = store.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field, UPLOAD_FIELD);
    assert_eq!(uploads[0].file_name.as_deref(), Some("recording0.ogg"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("audio/ogg"));
    assert_eq!(uploads[0].bytes, b"OggS-test-bytes");

    // Then: The created record is returned as described by the store
    assert_eq!(record, RecordingRecord::new("r1", "r1.webm"));
}

/// WHAT: Extra fields in the created record are kept
/// WHY: The client must not lose what the store reports about a record
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_store_returns_extra_fields_when_uploading_then_fields_preserved() {
    // Given: A store that describes records with extra metadata
    let (store, base_url) = FakeStore::spawn().await;
    store.respond_to_upload_with(json!({
        "_id": "r2",
        "path": "uploads/r2.ogg",
        "createdAt": "2024-01-01T00:00:00Z",
        "__v": 0
    }));
    let client = UploadClient::new(endpoint(&base_url));

    // When: Uploading
    let record = client.upload(&blob()).await.unwrap();

    // Then: Extra fields survive
    assert_eq!(record.id, "r2");
    assert_eq!(record.extra["createdAt"], "2024-01-01T00:00:00Z");
    assert_eq!(record.extra["__v"], 0);
}

/// WHAT: A non-success status is an UploadFailed
/// WHY: The caller must keep the blob when the store refuses it
#[tokio::test]
async fn given_store_error_when_uploading_then_upload_failed() {
    // Given: A store that rejects uploads
    let (store, base_url) = FakeStore::spawn().await;
    store.fail_upload(true);
    let client = UploadClient::new(endpoint(&base_url));

    // When: Uploading
    let result = client.upload(&blob()).await;

    // Then: UploadFailed after exactly one attempt
    assert!(matches!(result, Err(CoreError::UploadFailed { .. })));
    assert_eq!(store.uploads().len(), 1);
}

/// WHAT: A transport failure is an UploadFailed
/// WHY: Network errors surface as a value, never as a crash
#[tokio::test]
async fn given_unreachable_store_when_uploading_then_upload_failed() {
    // Given: A client pointed at a closed port
    let client = UploadClient::new(endpoint(&unreachable_base_url().await));

    // When: Uploading
    let result = client.upload(&blob()).await;

    // Then: UploadFailed
    assert!(matches!(result, Err(CoreError::UploadFailed { .. })));
}

/// WHAT: A success response without a record shape is an UploadFailed
/// WHY: A record with no id could never be deleted
#[tokio::test]
async fn given_malformed_response_when_uploading_then_upload_failed() {
    // Given: A store answering with an unrelated JSON body
    let (store, base_url) = FakeStore::spawn().await;
    store.respond_to_upload_with(json!({ "message": "saved" }));
    let client = UploadClient::new(endpoint(&base_url));

    // When: Uploading
    let result = client.upload(&blob()).await;

    // Then: UploadFailed
    assert!(matches!(result, Err(CoreError::UploadFailed { .. })));
}
