use uuid::Uuid;

/// Commands sent from the console handler to the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start a new recording session.
    StartRecording {
        /// Unique session ID for this recording.
        session_id: Uuid,
    },
    /// Stop the current recording and upload it.
    StopRecording,
    /// Print the cached recordings list.
    ListRecordings,
    /// Re-fetch the recordings list from the store.
    Refresh,
    /// Delete a recording from the store.
    Delete {
        /// Store-assigned id of the recording.
        id: String,
    },
    /// Open a recording in the system player.
    Play {
        /// Store-assigned id of the recording.
        id: String,
    },
    /// Re-submit the clip whose upload failed.
    RetryUpload,
    /// Print the command summary.
    Help,
    /// Request application shutdown.
    Shutdown,
}
