use crate::{
    CoreError, CoreResult,
    audio::{AudioFormat, AudioSource, ChunkSink, InputHandle},
};

use std::panic::Location;

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Microphone access through the default `cpal` host.
///
/// The device is resolved on every acquisition so a microphone plugged in
/// after startup is picked up by the next capture.
#[derive(Debug, Clone, Default)]
pub struct CpalSource {
    selected_device: Option<String>,
}

impl CpalSource {
    /// Creates a source for the named input device, or the default one.
    pub fn new(selected_device: Option<String>) -> Self {
        Self { selected_device }
    }

    #[track_caller]
    fn resolve_device(&self) -> CoreResult<Device> {
        let host = cpal::default_host();

        let Some(wanted) = self.selected_device.as_deref() else {
            return host
                .default_input_device()
                .ok_or(CoreError::CaptureUnavailable {
                    reason: "No microphone found".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
        };

        let mut devices = host
            .input_devices()
            .map_err(|e| CoreError::CaptureUnavailable {
                reason: format!("Failed to enumerate input devices: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        #[allow(deprecated)]
        let found = devices.find(|d| d.name().is_ok_and(|name| name == wanted));

        match found {
            Some(device) => Ok(device),
            None => {
                warn!(device = wanted, "Selected input device not found, using default");
                host.default_input_device()
                    .ok_or(CoreError::CaptureUnavailable {
                        reason: format!("Input device '{}' not found", wanted),
                        location: ErrorLocation::from(Location::caller()),
                    })
            }
        }
    }
}

impl AudioSource for CpalSource {
    #[track_caller]
    #[instrument(skip(self, sink))]
    fn acquire(&mut self, sink: ChunkSink) -> CoreResult<Box<dyn InputHandle>> {
        let device = self.resolve_device()?;

        let config: StreamConfig = device
            .default_input_config()
            .map_err(|e| CoreError::CaptureUnavailable {
                reason: format!("Failed to get config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .into();

        let data_sink = sink.clone();
        let error_sink = sink;

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    data_sink.push(data);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_sink.fault(err.to_string());
                },
                None,
            )
            .map_err(|e| CoreError::CaptureUnavailable {
                reason: format!("Failed to build stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| CoreError::CaptureUnavailable {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let format = AudioFormat {
            sample_rate: config.sample_rate,
            channels: config.channels,
        };

        info!(
            device_id = ?device.id(),
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Input device acquired"
        );

        Ok(Box::new(CpalInput { stream, format }))
    }
}

struct CpalInput {
    stream: Stream,
    format: AudioFormat,
}

impl InputHandle for CpalInput {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn release(self: Box<Self>) {
        if let Err(e) = self.stream.pause() {
            debug!(error = %e, "Failed to pause stream before release");
        }
        drop(self.stream);
        info!("Input device released");
    }
}
