use crate::{
    CoreError, CoreResult,
    audio::{AudioBlob, DeviceFault},
    remote::{RecordingRecord, RecordingsList, RecordingsStore, StoreEndpoint, UploadClient},
    session::{CaptureSession, Clock, SessionState},
};

use std::{collections::VecDeque, panic::Location};

use error_location::ErrorLocation;
use reqwest::Url;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Orchestrates capture, timing, upload, and list reconciliation.
///
/// This is the single authority over session transitions:
///
/// - **Idle → Recording** on [`Self::start`]: capture starts, then the clock
///   is armed.
/// - **Recording → Idle** on [`Self::stop`]: capture stops, the clock is
///   disarmed, and only then is the blob uploaded. Upload failure does not
///   bring the session back to Recording.
///
/// Blobs the store has not accepted wait in a FIFO queue. Each stop or retry
/// sends the whole queue oldest-first, so a failed clip is never dropped by a
/// later recording.
/// - **Recording → Idle** on [`Self::handle_device_fault`]: capture aborts and
///   the clock is disarmed so no timer keeps running.
///
/// Every operation takes `&mut self`, so one owner serializes all requests.
pub struct SessionController {
    capture: CaptureSession,
    clock: Clock,
    uploader: UploadClient,
    store: RecordingsStore,
    /// Finalized blobs whose upload has not been confirmed yet, oldest first.
    pending_uploads: VecDeque<AudioBlob>,
}

impl SessionController {
    /// Wires the collaborators together. Starts Idle with an empty cache.
    pub fn new(
        capture: CaptureSession,
        clock: Clock,
        uploader: UploadClient,
        store: RecordingsStore,
    ) -> Self {
        Self {
            capture,
            clock,
            uploader,
            store,
            pending_uploads: VecDeque::new(),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.capture.state()
    }

    /// Seconds elapsed in the current capture; zero while Idle.
    pub fn elapsed(&self) -> u64 {
        self.clock.elapsed()
    }

    /// Receiver for elapsed-seconds updates.
    pub fn subscribe_elapsed(&self) -> watch::Receiver<u64> {
        self.clock.subscribe()
    }

    /// Cached recordings as of the last successful refresh.
    pub fn recordings(&self) -> RecordingsList {
        self.store.recordings()
    }

    /// Receiver for recordings-list replacements.
    pub fn subscribe_recordings(&self) -> watch::Receiver<RecordingsList> {
        self.store.subscribe()
    }

    /// Store this controller synchronizes with.
    pub fn endpoint(&self) -> &StoreEndpoint {
        self.store.endpoint()
    }

    /// Playback URL of a cached recording.
    pub fn playback_url(&self, id: &str) -> Option<Url> {
        self.store
            .find(id)
            .map(|record| self.store.endpoint().media_url(&record.path))
    }

    /// Whether a blob from a failed upload is waiting for [`Self::retry_upload`].
    pub fn has_pending_upload(&self) -> bool {
        !self.pending_uploads.is_empty()
    }

    /// Number of blobs waiting for [`Self::retry_upload`].
    pub fn pending_uploads(&self) -> usize {
        self.pending_uploads.len()
    }

    /// Begins a capture and arms the clock.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyRecording`] while Recording; nothing changes.
    /// - [`CoreError::CaptureUnavailable`] if the device is unavailable; the
    ///   session stays Idle and the clock stays disarmed.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        self.capture.start()?;
        self.clock.arm();
        info!("Session recording");
        Ok(())
    }

    /// Stops the capture, uploads it behind any earlier unsent blobs, and
    /// refreshes the list.
    ///
    /// The session is Idle and the clock reset before the upload begins.
    /// Returns every record the store created, oldest capture first.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoActiveSession`] while Idle; nothing changes.
    /// - [`CoreError::EncodingFailed`] if the capture could not be finalized.
    /// - [`CoreError::UploadFailed`] if the store accepted nothing; every blob
    ///   is kept for [`Self::retry_upload`] and the list is unchanged.
    /// - [`CoreError::PartiallySaved`] if some blobs were accepted before a
    ///   later upload or the list refresh failed. Unaccepted blobs stay queued.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> CoreResult<Vec<RecordingRecord>> {
        if self.capture.state() == SessionState::Idle {
            debug!("Stop ignored, session idle");
            return Err(CoreError::NoActiveSession {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // Capture has physically ended whatever the finalize outcome.
        let finalized = self.capture.stop();
        self.clock.disarm();
        let blob = finalized?;

        self.pending_uploads.push_back(blob);

        self.upload_pending().await
    }

    /// Re-submits every blob retained from failed uploads, oldest first.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoPendingUpload`] if nothing is retained.
    /// - [`CoreError::UploadFailed`] or [`CoreError::PartiallySaved`] as for
    ///   [`Self::stop`].
    #[instrument(skip(self))]
    pub async fn retry_upload(&mut self) -> CoreResult<Vec<RecordingRecord>> {
        self.upload_pending().await
    }

    /// Re-fetches the recordings list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FetchFailed`]; the cache is unchanged.
    pub async fn refresh(&self) -> CoreResult<()> {
        self.store.refresh().await
    }

    /// Deletes a recording and re-fetches the list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DeleteFailed`] or [`CoreError::FetchFailed`]; in
    /// both cases the cache is unchanged.
    pub async fn remove(&self, id: &str) -> CoreResult<()> {
        self.store.remove(id).await
    }

    /// Waits for the platform to report a device failure.
    pub async fn next_device_fault(&mut self) -> Option<DeviceFault> {
        self.capture.next_fault().await
    }

    /// Forces the session back to Idle after a device failure.
    ///
    /// Faults arriving after the capture already ended are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CaptureUnavailable`] describing the fault when a
    /// running capture had to be aborted.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn handle_device_fault(&mut self, fault: DeviceFault) -> CoreResult<()> {
        if !self.capture.abort() {
            debug!(reason = %fault.reason, "Device fault after capture ended, ignoring");
            return Ok(());
        }

        self.clock.disarm();
        error!(reason = %fault.reason, "Capture interrupted by device failure");

        Err(CoreError::CaptureUnavailable {
            reason: fault.reason,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    async fn upload_pending(&mut self) -> CoreResult<Vec<RecordingRecord>> {
        if self.pending_uploads.is_empty() {
            return Err(CoreError::NoPendingUpload {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut saved = Vec::new();

        while let Some(blob) = self.pending_uploads.front() {
            let sequence = blob.sequence();
            let result = self.uploader.upload(blob).await;

            match result {
                Ok(record) => {
                    info!(sequence, id = %record.id, "Upload accepted");
                    self.pending_uploads.pop_front();
                    saved.push(record);
                }
                Err(e) => {
                    warn!(
                        sequence,
                        pending = self.pending_uploads.len(),
                        error = %e,
                        "Upload failed, blobs retained for retry"
                    );

                    let Some(last) = saved.last() else {
                        return Err(e);
                    };

                    // Accepted clips should still show up in the list.
                    if let Err(refresh) = self.store.record_created(last).await {
                        warn!(error = %refresh, "Refresh after partial upload failed");
                    }

                    return Err(partially_saved(&saved, e));
                }
            }
        }

        if let Some(last) = saved.last() {
            if let Err(e) = self.store.record_created(last).await {
                warn!(
                    saved = saved.len(),
                    error = %e,
                    "Uploads accepted but list refresh failed"
                );
                return Err(partially_saved(&saved, e));
            }
        }

        Ok(saved)
    }
}

#[track_caller]
fn partially_saved(saved: &[RecordingRecord], source: CoreError) -> CoreError {
    CoreError::PartiallySaved {
        saved: saved.iter().map(|record| record.id.clone()).collect(),
        source: Box::new(source),
        location: ErrorLocation::from(Location::caller()),
    }
}
