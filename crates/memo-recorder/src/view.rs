//! Plain-text rendering of session and store state for the console.

use memo_recorder_core::{CoreError, RecordingRecord, StoreEndpoint};

use std::fmt::Write;

/// Shown in place of the list when the store holds no recordings.
pub(crate) const EMPTY_LIST: &str = "No recordings available.";

/// Command summary printed by `help` and after unrecognized input.
pub(crate) const HELP: &str = "\
Commands:
  start         begin recording
  stop          stop recording and upload
  list          show cached recordings
  refresh       reload recordings from the store
  delete <id>   delete a recording
  play <id>     open a recording in the system player
  retry         re-send failed uploads
  help          show this summary
  quit          exit";

/// One line per record, in store order, each with its playback URL.
pub(crate) fn render_recordings(records: &[RecordingRecord], endpoint: &StoreEndpoint) -> String {
    if records.is_empty() {
        return EMPTY_LIST.to_string();
    }

    let mut out = String::from("Recordings:");
    for (index, record) in records.iter().enumerate() {
        let _ = write!(
            out,
            "\n  {:>2}. {}  {}",
            index + 1,
            record.id,
            endpoint.media_url(&record.path)
        );
    }
    out
}

/// Confirmation for uploads the store accepted, oldest first.
pub(crate) fn render_saved(ids: &[String]) -> String {
    match ids {
        [id] => format!("Saved recording {}.", id),
        _ => format!("Saved recordings {}.", ids.join(", ")),
    }
}

pub(crate) fn render_timer(seconds: u64) -> String {
    format!("Recording: {}s", seconds)
}

/// User-facing sentence for a failed operation.
pub(crate) fn describe_error(error: &CoreError) -> String {
    match error {
        CoreError::CaptureUnavailable { reason, .. } => {
            format!("Microphone unavailable: {}", reason)
        }
        CoreError::NoActiveSession { .. } => "Not recording.".to_string(),
        CoreError::AlreadyRecording { .. } => "Already recording.".to_string(),
        CoreError::EncodingFailed { reason, .. } => {
            format!("Could not finalize the recording: {}", reason)
        }
        CoreError::InvalidEndpoint { reason, .. } => {
            format!("Store address is not usable: {}", reason)
        }
        CoreError::UploadFailed { .. } => {
            "Upload failed. Unsent clips are kept; type 'retry' to send them again.".to_string()
        }
        CoreError::NoPendingUpload { .. } => "Nothing to retry.".to_string(),
        CoreError::FetchFailed { .. } => {
            "Could not reach the store. Showing the last known list.".to_string()
        }
        CoreError::DeleteFailed { id, .. } => format!("Could not delete '{}'.", id),
        CoreError::PartiallySaved { saved, source, .. } => {
            format!("{} {}", render_saved(saved), describe_error(source))
        }
    }
}
