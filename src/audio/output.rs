// Audio output through cpal
//
// Opens the default output device and drains the APU's ring buffer from the
// stream callback. The emulator produces mono at 44.1 kHz; if the device
// opens with more channels, the callback duplicates the sample across the
// frame. Underrun plays silence.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use log::{info, warn};

use super::ring_buffer::Consumer;
use crate::error::FrontendError;
use crate::SAMPLE_RATE;

/// Live audio stream; dropping it stops playback
pub struct AudioOutput {
    _stream: Stream,
}

impl AudioOutput {
    /// Open the default device at 44.1 kHz and start draining `consumer`.
    pub fn new(mut consumer: Consumer, volume: f32) -> Result<Self, FrontendError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| FrontendError::AudioInitFailure("no output device".into()))?;

        info!(
            "audio device: {}",
            device.name().unwrap_or_else(|_| "<unnamed>".into())
        );

        let channels = device
            .default_output_config()
            .map_err(|e| FrontendError::AudioInitFailure(e.to_string()))?
            .channels();

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(SAMPLE_RATE as u32),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels as usize) {
                        let sample = consumer.pop().unwrap_or(0.0) * volume;
                        for slot in frame {
                            *slot = sample;
                        }
                    }
                },
                |err| warn!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| FrontendError::AudioInitFailure(e.to_string()))?;

        stream
            .play()
            .map_err(|e| FrontendError::AudioInitFailure(e.to_string()))?;

        info!("audio output running: {} Hz, {} channel(s)", SAMPLE_RATE, channels);

        Ok(AudioOutput { _stream: stream })
    }
}
