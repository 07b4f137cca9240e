use error_location::ErrorLocation;
use thiserror::Error;

/// Boxed underlying cause carried by network failures.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

/// Recording-session and remote-store errors with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input device denied, missing, or failed while recording.
    #[error("Capture unavailable: {reason} {location}")]
    CaptureUnavailable {
        /// Description of the device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Stop requested while nothing is recording.
    #[error("No active capture session {location}")]
    NoActiveSession {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Start requested while a capture is already running.
    #[error("Capture session already recording {location}")]
    AlreadyRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Captured audio could not be encoded into a blob.
    #[error("Encoding failed: {reason} {location}")]
    EncodingFailed {
        /// Description of the encoder failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Store base URL is unusable or the HTTP client could not be built.
    #[error("Invalid store endpoint: {reason} {location}")]
    InvalidEndpoint {
        /// Description of the configuration problem.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Upload rejected by the store or lost in transport.
    #[error("Upload failed: {source} {location}")]
    UploadFailed {
        /// Transport error or non-success status description.
        #[source]
        source: BoxedCause,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Retry requested with no retained blob.
    #[error("No pending upload to retry {location}")]
    NoPendingUpload {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Listing the store's recordings failed.
    #[error("Fetch failed: {source} {location}")]
    FetchFailed {
        /// Transport error or non-success status description.
        #[source]
        source: BoxedCause,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Deleting a recording failed.
    #[error("Delete of {id} failed: {source} {location}")]
    DeleteFailed {
        /// Identifier of the record that could not be deleted.
        id: String,
        /// Transport error or non-success status description.
        #[source]
        source: BoxedCause,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The store accepted some uploads before a later upload or the
    /// following list refresh failed.
    #[error("Saved {saved:?} before failing: {source} {location}")]
    PartiallySaved {
        /// Identifiers the store assigned, oldest capture first.
        saved: Vec<String>,
        /// [`CoreError::UploadFailed`] or [`CoreError::FetchFailed`].
        #[source]
        source: Box<CoreError>,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
