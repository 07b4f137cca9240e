//! Memo-recorder Core Library
//!
//! Recording-session lifecycle and remote-store synchronization: microphone
//! capture through CPAL, an elapsed-seconds clock bound to the session,
//! multipart upload of each finalized clip, and a recordings cache that is
//! always refetched from the store after a mutation.
//!
//! # Example
//!
//! ```no_run
//! use memo_recorder_core::{
//!     CaptureSession, Clock, CoreResult, CpalSource, RecordingsStore, SessionController,
//!     StoreEndpoint, UploadClient,
//! };
//!
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let endpoint = StoreEndpoint::new("http://localhost:5000", None)?;
//!     let mut controller = SessionController::new(
//!         CaptureSession::new(Box::new(CpalSource::default())),
//!         Clock::default(),
//!         UploadClient::new(endpoint.clone()),
//!         RecordingsStore::new(endpoint),
//!     );
//!
//!     controller.start()?;
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     for record in controller.stop().await? {
//!         println!("Saved {} at {}", record.id, record.path);
//!     }
//!     Ok(())
//! }
//! ```

mod audio;
mod error;
mod remote;
mod session;

pub use {
    audio::{
        AudioBlob, AudioFormat, AudioSource, ChunkSink, CpalSource, DeviceFault, InputHandle,
        OGG_OPUS_EXTENSION, OGG_OPUS_MIME_TYPE, OPUS_SAMPLE_RATE, encode_opus,
    },
    error::{BoxedCause, CoreError, Result as CoreResult},
    remote::{
        RecordingRecord, RecordingsList, RecordingsStore, StoreEndpoint, UPLOAD_FIELD,
        UploadClient,
    },
    session::{CaptureSession, Clock, DEFAULT_TICK_PERIOD, SessionController, SessionState},
};
