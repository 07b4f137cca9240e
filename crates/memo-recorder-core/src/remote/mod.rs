pub(crate) mod endpoint;
mod record;
mod store;
mod upload;

pub use {
    endpoint::StoreEndpoint,
    record::{RecordingRecord, RecordingsList},
    store::RecordingsStore,
    upload::{UPLOAD_FIELD, UploadClient},
};
