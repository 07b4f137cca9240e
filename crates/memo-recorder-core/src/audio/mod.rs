mod buffer;
mod cpal_source;
mod encoder;
pub(crate) mod resampler;
mod source;

pub(crate) use buffer::CaptureBuffer;

pub use {
    cpal_source::CpalSource,
    encoder::{
        AudioBlob, OGG_OPUS_EXTENSION, OGG_OPUS_MIME_TYPE, OPUS_SAMPLE_RATE, encode_opus,
    },
    source::{AudioFormat, AudioSource, ChunkSink, DeviceFault, InputHandle},
};
