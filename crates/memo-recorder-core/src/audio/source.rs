//! Seam between a capture session and the platform microphone facility.

use crate::{CoreResult, audio::CaptureBuffer};

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::mpsc;
use tracing::error;

/// Stream parameters reported by an acquired input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

/// Unexpected device failure reported while a capture is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFault {
    /// Platform description of what went wrong.
    pub reason: String,
}

/// Write-only handle a source uses to deliver audio into a capture session.
///
/// Once the session releases the device the sink goes inert: late chunks and
/// faults from an in-flight platform callback are discarded.
#[derive(Clone)]
pub struct ChunkSink {
    buffer: Arc<Mutex<CaptureBuffer>>,
    released: Arc<AtomicBool>,
    faults: mpsc::UnboundedSender<DeviceFault>,
}

impl ChunkSink {
    pub(crate) fn new(
        buffer: Arc<Mutex<CaptureBuffer>>,
        released: Arc<AtomicBool>,
        faults: mpsc::UnboundedSender<DeviceFault>,
    ) -> Self {
        Self {
            buffer,
            released,
            faults,
        }
    }

    /// Appends one chunk of interleaved samples.
    pub fn push(&self, samples: &[f32]) {
        if self.is_released() {
            return;
        }
        // A poisoned lock still holds valid chunks; keep recording into it.
        let mut buf = self.buffer.lock().unwrap_or_else(|e| {
            error!("Capture buffer lock poisoned, recovering: {}", e);
            e.into_inner()
        });
        buf.push(samples);
    }

    /// Reports that the device stopped delivering audio.
    pub fn fault(&self, reason: impl Into<String>) {
        if self.is_released() {
            return;
        }
        let _ = self.faults.send(DeviceFault {
            reason: reason.into(),
        });
    }

    /// Whether the owning session has already released the device.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

/// Platform audio-capture facility.
pub trait AudioSource: Send {
    /// Requests the input device and starts delivering chunks to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::CaptureUnavailable`] when access is denied
    /// or the device cannot be opened.
    fn acquire(&mut self, sink: ChunkSink) -> CoreResult<Box<dyn InputHandle>>;
}

/// A live, acquired input device.
pub trait InputHandle: Send {
    /// Format of the samples being delivered.
    fn format(&self) -> AudioFormat;

    /// Stops delivery and gives the device back to the platform.
    fn release(self: Box<Self>);
}
