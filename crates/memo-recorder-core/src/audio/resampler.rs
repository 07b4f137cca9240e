use crate::{CoreError, CoreResult};

use std::panic::Location;

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Mono sample-rate converter feeding the Opus encoder.
pub(crate) struct Resampler {
    resampler: Fft<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl Resampler {
    #[track_caller]
    #[instrument]
    pub(crate) fn new(input_rate: u32, output_rate: u32) -> CoreResult<Self> {
        let resampler = Fft::<f32>::new(
            input_rate as usize,
            output_rate as usize,
            CHUNK_SIZE,
            SUB_CHUNKS,
            1,
            FixedSync::Input,
        )
        .map_err(|e| CoreError::EncodingFailed {
            reason: format!("Failed to create resampler: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(input_rate, output_rate, "Resampler initialized");

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
        })
    }

    /// Converts a whole capture. The last chunk is zero-padded and the
    /// output trimmed to the exact rate-scaled length.
    #[track_caller]
    #[instrument(skip(self, samples), fields(input_len = samples.len()))]
    pub(crate) fn resample(&mut self, samples: &[f32]) -> CoreResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let expected_len = (samples.len() as u64 * u64::from(self.output_rate)
            / u64::from(self.input_rate)) as usize;
        let mut output = Vec::with_capacity(expected_len + CHUNK_SIZE);

        for chunk in samples.chunks(CHUNK_SIZE) {
            let mut input_chunk = chunk.to_vec();
            input_chunk.resize(CHUNK_SIZE, 0.0);

            let input_adapter = InterleavedSlice::new(&input_chunk, 1, CHUNK_SIZE).map_err(|e| {
                CoreError::EncodingFailed {
                    reason: format!("Failed to create input adapter: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

            let output_frames = self.resampler.output_frames_max();
            let mut output_chunk = vec![0.0f32; output_frames];

            let mut output_adapter = InterleavedSlice::new_mut(&mut output_chunk, 1, output_frames)
                .map_err(|e| CoreError::EncodingFailed {
                    reason: format!("Failed to create output adapter: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            let (_, written) = self
                .resampler
                .process_into_buffer(&input_adapter, &mut output_adapter, None)
                .map_err(|e| CoreError::EncodingFailed {
                    reason: format!("Resampling failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            output.extend_from_slice(&output_chunk[..written]);
        }

        output.resize(expected_len, 0.0);

        debug!(output_len = output.len(), "Resampled capture");

        Ok(output)
    }
}
