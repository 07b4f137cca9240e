use crate::{
    CoreError, CoreResult,
    audio::AudioBlob,
    remote::{RecordingRecord, StoreEndpoint, endpoint::UPLOAD_ROUTE},
};

use std::panic::Location;

use error_location::ErrorLocation;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, instrument, warn};

/// Multipart field name the store reads the audio from.
pub const UPLOAD_FIELD: &str = "recording";

/// Submits finalized blobs to the store's ingestion endpoint.
///
/// One request per call. Nothing is retried here; the caller keeps the blob
/// and decides whether to try again.
#[derive(Debug, Clone)]
pub struct UploadClient {
    endpoint: StoreEndpoint,
}

impl UploadClient {
    /// Creates an upload client for the given store.
    pub fn new(endpoint: StoreEndpoint) -> Self {
        Self { endpoint }
    }

    /// Uploads `blob` as a single-part multipart form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UploadFailed`] on transport failure, a non-success
    /// status, or an unreadable response body.
    #[instrument(skip(self, blob), fields(file_name = %blob.file_name(), byte_len = blob.len()))]
    pub async fn upload(&self, blob: &AudioBlob) -> CoreResult<RecordingRecord> {
        let part = Part::bytes(blob.bytes().to_vec())
            .file_name(blob.file_name())
            .mime_str(blob.mime_type())
            .map_err(|e| CoreError::UploadFailed {
                source: Box::new(e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let form = Form::new().part(UPLOAD_FIELD, part);
        let url = self.endpoint.route(UPLOAD_ROUTE);

        debug!(url = %url, "Uploading recording");

        let response = self
            .endpoint
            .client()
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CoreError::UploadFailed {
                source: Box::new(e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Store rejected upload");
            return Err(CoreError::UploadFailed {
                source: format!("Store responded with {}", status).into(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let record = response
            .json::<RecordingRecord>()
            .await
            .map_err(|e| CoreError::UploadFailed {
                source: Box::new(e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(id = %record.id, path = %record.path, "Recording uploaded");

        Ok(record)
    }
}
