use crate::{
    CoreError, CoreResult,
    audio::{
        AudioBlob, AudioFormat, AudioSource, CaptureBuffer, ChunkSink, DeviceFault, InputHandle,
        encode_opus,
    },
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use error_location::ErrorLocation;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Capture lifecycle state. There is no paused state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not recording; the only state a capture may start from.
    #[default]
    Idle,
    /// Microphone acquired and chunks accumulating.
    Recording,
}

/// Device handle and buffer that exist only while Recording.
struct ActiveCapture {
    input: Box<dyn InputHandle>,
    buffer: Arc<Mutex<CaptureBuffer>>,
    /// Set before the device is released so late callbacks become no-ops.
    released: Arc<AtomicBool>,
}

impl ActiveCapture {
    fn release(self) -> (AudioFormat, Arc<Mutex<CaptureBuffer>>) {
        self.released.store(true, Ordering::Release);
        let format = self.input.format();
        self.input.release();
        (format, self.buffer)
    }
}

/// Owns the microphone and the capture buffer for one recorder.
///
/// `Recording` holds exactly when a device handle is live, so the state can
/// never disagree with device ownership. The device is released on stop, on
/// abort, and when the session is dropped.
pub struct CaptureSession {
    source: Box<dyn AudioSource>,
    active: Option<ActiveCapture>,
    faults_tx: mpsc::UnboundedSender<DeviceFault>,
    faults_rx: mpsc::UnboundedReceiver<DeviceFault>,
    next_sequence: u64,
}

impl CaptureSession {
    /// Creates an idle session over the given platform source.
    pub fn new(source: Box<dyn AudioSource>) -> Self {
        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        Self {
            source,
            active: None,
            faults_tx,
            faults_rx,
            next_sequence: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Recording
        } else {
            SessionState::Idle
        }
    }

    /// Acquires the input device and begins a fresh capture.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyRecording`] if a capture is running; the device
    ///   is not touched.
    /// - [`CoreError::CaptureUnavailable`] if the device is denied or fails;
    ///   the session stays Idle with no buffer.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        if self.active.is_some() {
            warn!("Start requested while already recording");
            return Err(CoreError::AlreadyRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // Faults queued by a previous capture say nothing about this one.
        while self.faults_rx.try_recv().is_ok() {}

        let buffer = Arc::new(Mutex::new(CaptureBuffer::default()));
        let released = Arc::new(AtomicBool::new(false));
        let sink = ChunkSink::new(
            Arc::clone(&buffer),
            Arc::clone(&released),
            self.faults_tx.clone(),
        );

        let input = match self.source.acquire(sink) {
            Ok(input) => input,
            Err(e) => {
                released.store(true, Ordering::Release);
                error!(error = %e, "Failed to acquire input device");
                return Err(e);
            }
        };

        self.active = Some(ActiveCapture {
            input,
            buffer,
            released,
        });

        info!("Capture started");

        Ok(())
    }

    /// Releases the device and finalizes the buffer into one blob.
    ///
    /// The session is Idle afterwards even when encoding fails.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoActiveSession`] if Idle; nothing is mutated.
    /// - [`CoreError::EncodingFailed`] if the container cannot be written.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> CoreResult<AudioBlob> {
        let Some(active) = self.active.take() else {
            debug!("Stop requested with no active capture");
            return Err(CoreError::NoActiveSession {
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let (format, buffer) = active.release();

        let samples = {
            let mut buf = buffer.lock().unwrap_or_else(|e| {
                error!("Capture buffer lock poisoned, recovering: {}", e);
                e.into_inner()
            });
            debug!(
                chunk_count = buf.chunk_count(),
                sample_count = buf.sample_count(),
                "Finalizing capture buffer"
            );
            buf.drain()
        };

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let blob = encode_opus(&samples, format, sequence)?;

        info!(sequence, byte_len = blob.len(), "Capture stopped");

        Ok(blob)
    }

    /// Leaves Recording without producing a blob.
    ///
    /// Returns `false` if there was nothing to abort.
    #[instrument(skip(self))]
    pub fn abort(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                let _ = active.release();
                warn!("Capture aborted, buffered audio discarded");
                true
            }
            None => false,
        }
    }

    /// Waits for the next device fault reported by the platform.
    ///
    /// Never resolves while no fault is pending, which makes it suitable as a
    /// `select!` branch.
    pub async fn next_fault(&mut self) -> Option<DeviceFault> {
        self.faults_rx.recv().await
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.release();
            debug!("Capture session dropped while recording, device released");
        }
    }
}
