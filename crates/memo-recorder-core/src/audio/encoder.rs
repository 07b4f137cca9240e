use crate::{
    CoreError, CoreResult,
    audio::{AudioFormat, resampler::Resampler},
};

use std::panic::Location;

use error_location::ErrorLocation;
use ogg::writing::{PacketWriteEndInfo, PacketWriter};
use opus::{Application, Bitrate, Channels, Encoder};
use tracing::{debug, instrument};

/// MIME type of blobs produced by [`encode_opus`].
pub const OGG_OPUS_MIME_TYPE: &str = "audio/ogg";

/// File extension of blobs produced by [`encode_opus`].
pub const OGG_OPUS_EXTENSION: &str = "ogg";

/// Rate every blob is encoded at; Ogg Opus granule positions count in it.
pub const OPUS_SAMPLE_RATE: u32 = 48_000;

// 20 ms at 48 kHz.
const FRAME_SAMPLES: usize = 960;
const MAX_PACKET_BYTES: usize = 4000;
const VOICE_BITRATE: i32 = 32_000;
const VENDOR: &str = "memo-recorder";

/// A single finalized unit of encoded audio, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    bytes: Vec<u8>,
    mime_type: String,
    extension: String,
    sequence: u64,
}

impl AudioBlob {
    /// Wraps already-encoded bytes.
    ///
    /// `sequence` numbers blobs within this process and names the upload
    /// file `recording{sequence}.{extension}`.
    pub fn new(
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        extension: impl Into<String>,
        sequence: u64,
    ) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            extension: extension.into(),
            sequence,
        }
    }

    /// Encoded container bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type sent with the upload.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Position of this blob among those finalized by the session.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Filename the store receives.
    pub fn file_name(&self) -> String {
        format!("recording{}.{}", self.sequence, self.extension)
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob carries no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encodes interleaved f32 samples as mono Opus in an Ogg container.
///
/// Channels are averaged to mono and the result resampled to
/// [`OPUS_SAMPLE_RATE`]. Out-of-range samples are clamped to [-1.0, 1.0];
/// NaN encodes as silence. An empty capture still yields a complete stream
/// with zero playable samples.
///
/// # Errors
///
/// Returns [`CoreError::EncodingFailed`] for a zero rate or channel count, or
/// when the resampler, Opus encoder, or Ogg writer fails.
#[track_caller]
#[instrument(skip(samples))]
pub fn encode_opus(samples: &[f32], format: AudioFormat, sequence: u64) -> CoreResult<AudioBlob> {
    if format.sample_rate == 0 || format.channels == 0 {
        return Err(CoreError::EncodingFailed {
            reason: format!(
                "Unusable capture format: {} Hz, {} channels",
                format.sample_rate, format.channels
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mono = downmix(samples, format.channels);
    let pcm = if format.sample_rate == OPUS_SAMPLE_RATE {
        mono
    } else {
        Resampler::new(format.sample_rate, OPUS_SAMPLE_RATE)?.resample(&mono)?
    };

    let mut encoder = Encoder::new(OPUS_SAMPLE_RATE, Channels::Mono, Application::Voip)
        .map_err(|e| encoding_failed("Failed to create Opus encoder", e))?;
    encoder
        .set_bitrate(Bitrate::Bits(VOICE_BITRATE))
        .map_err(|e| encoding_failed("Failed to set Opus bitrate", e))?;
    let pre_skip = encoder
        .get_lookahead()
        .map_err(|e| encoding_failed("Failed to query Opus lookahead", e))?;
    let pre_skip = u16::try_from(pre_skip).unwrap_or(0);

    let serial = 0x6d65_6d6f ^ (sequence as u32);
    let mut writer = PacketWriter::new(Vec::with_capacity(pcm.len() / 8));

    writer
        .write_packet(opus_head(pre_skip), serial, PacketWriteEndInfo::EndPage, 0)
        .map_err(|e| encoding_failed("Failed to write OpusHead", e))?;
    writer
        .write_packet(opus_tags(), serial, PacketWriteEndInfo::EndPage, 0)
        .map_err(|e| encoding_failed("Failed to write OpusTags", e))?;

    let frame_count = pcm.len().div_ceil(FRAME_SAMPLES).max(1);
    let mut frame = [0.0f32; FRAME_SAMPLES];

    for index in 0..frame_count {
        let start = index * FRAME_SAMPLES;
        let end = (start + FRAME_SAMPLES).min(pcm.len());
        frame.fill(0.0);
        if start < end {
            frame[..end - start].copy_from_slice(&pcm[start..end]);
        }

        let packet = encoder
            .encode_vec_float(&frame, MAX_PACKET_BYTES)
            .map_err(|e| encoding_failed("Failed to encode Opus frame", e))?;

        // Granule counts unpadded samples so players trim the last frame.
        let granule = u64::from(pre_skip) + end as u64;
        let end_info = if index + 1 == frame_count {
            PacketWriteEndInfo::EndStream
        } else {
            PacketWriteEndInfo::NormalPacket
        };

        writer
            .write_packet(packet, serial, end_info, granule)
            .map_err(|e| encoding_failed("Failed to write Opus packet", e))?;
    }

    let bytes = writer.into_inner();

    debug!(
        sample_count = samples.len(),
        encoded_samples = pcm.len(),
        frame_count,
        byte_len = bytes.len(),
        sequence,
        "Encoded capture to Ogg Opus"
    );

    Ok(AudioBlob::new(
        bytes,
        OGG_OPUS_MIME_TYPE,
        OGG_OPUS_EXTENSION,
        sequence,
    ))
}

fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let sanitize = |s: f32| if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) };

    if channels == 1 {
        return samples.iter().copied().map(sanitize).collect();
    }

    samples
        .chunks(usize::from(channels))
        .map(|frame| frame.iter().copied().map(sanitize).sum::<f32>() / f32::from(channels))
        .collect()
}

// RFC 7845 identification header, channel mapping family 0.
fn opus_head(pre_skip: u16) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1);
    head.push(1);
    head.extend_from_slice(&pre_skip.to_le_bytes());
    head.extend_from_slice(&OPUS_SAMPLE_RATE.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes());
    head.push(0);
    head
}

fn opus_tags() -> Vec<u8> {
    let mut tags = Vec::with_capacity(16 + VENDOR.len());
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(VENDOR.len() as u32).to_le_bytes());
    tags.extend_from_slice(VENDOR.as_bytes());
    tags.extend_from_slice(&0u32.to_le_bytes());
    tags
}

#[track_caller]
fn encoding_failed(context: &str, e: impl std::fmt::Display) -> CoreError {
    CoreError::EncodingFailed {
        reason: format!("{}: {}", context, e),
        location: ErrorLocation::from(Location::caller()),
    }
}
