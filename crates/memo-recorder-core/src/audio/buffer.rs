use std::collections::VecDeque;

use tracing::warn;

/// Maximum samples held for one capture (10 minutes at 48kHz stereo).
/// Oldest chunks are dropped once the bound is exceeded.
///
/// **Memory footprint at max capacity:**
/// - 48,000 Hz * 2 ch * 60s * 10 min * 4 bytes/f32 = ~230MB
/// - Clips are expected to be far shorter than this
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 2 * 60 * 10;

/// Ordered raw chunks produced during one Recording state.
#[derive(Debug)]
pub(crate) struct CaptureBuffer {
    chunks: VecDeque<Vec<f32>>,
    sample_count: usize,
    max_samples: usize,
    overflowed: bool,
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_BUFFER_SAMPLES)
    }
}

impl CaptureBuffer {
    pub(crate) fn with_limit(max_samples: usize) -> Self {
        Self {
            chunks: VecDeque::new(),
            sample_count: 0,
            max_samples,
            overflowed: false,
        }
    }

    pub(crate) fn push(&mut self, chunk: &[f32]) {
        if chunk.is_empty() {
            return;
        }

        self.chunks.push_back(chunk.to_vec());
        self.sample_count += chunk.len();

        while self.sample_count > self.max_samples {
            let Some(dropped) = self.chunks.pop_front() else {
                break;
            };
            self.sample_count -= dropped.len();

            if !self.overflowed {
                self.overflowed = true;
                warn!(
                    max_samples = self.max_samples,
                    "Capture buffer full, dropping oldest audio"
                );
            }
        }
    }

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Collapses all chunks into one contiguous sample run, leaving the buffer empty.
    pub(crate) fn drain(&mut self) -> Vec<f32> {
        let mut samples = Vec::with_capacity(self.sample_count);
        for chunk in self.chunks.drain(..) {
            samples.extend_from_slice(&chunk);
        }
        self.sample_count = 0;
        samples
    }
}
