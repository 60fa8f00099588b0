//! Live input - microphone capture feeding a level meter
//!
//! The device never depends on input being available; callers log an
//! [`AcquireError`] and keep running without a live source.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// RMS gain applied before the level is clamped to 1.0
pub const LEVEL_GAIN: f32 = 5.0;

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("No audio input device found")]
    NoInputDevice,
    #[error("Failed to get input config: {0}")]
    Config(String),
    #[error("Unsupported input sample format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to create input stream: {0}")]
    Build(String),
    #[error("Failed to start input: {0}")]
    Play(String),
}

/// Running capture stream from the default input device
///
/// Dropping it stops capture.
pub struct InputSource {
    _stream: cpal::Stream,
    level: Arc<AtomicU32>,
    device_name: String,
    sample_rate: u32,
}

impl InputSource {
    /// Open the default input device and start metering it
    pub fn acquire() -> Result<Self, AcquireError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AcquireError::NoInputDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let config = device
            .default_input_config()
            .map_err(|e| AcquireError::Config(e.to_string()))?;
        let sample_format = config.sample_format();
        let sample_rate = config.sample_rate().0;
        let stream_config: cpal::StreamConfig = config.into();

        let level = Arc::new(AtomicU32::new(0));
        let meter = level.clone();
        let err_fn = |err: cpal::StreamError| warn!(error = %err, "input stream error");

        let stream = match sample_format {
            SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    store_level(&meter, rms(data.iter().copied()));
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    store_level(&meter, rms(data.iter().map(|s| *s as f32 / i16::MAX as f32)));
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &stream_config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    store_level(
                        &meter,
                        rms(data.iter().map(|s| (*s as f32 - 32768.0) / 32768.0)),
                    );
                },
                err_fn,
                None,
            ),
            other => return Err(AcquireError::UnsupportedFormat(format!("{other:?}"))),
        }
        .map_err(|e| AcquireError::Build(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AcquireError::Play(e.to_string()))?;

        info!(device = %device_name, sample_rate, "input source acquired");
        Ok(Self {
            _stream: stream,
            level,
            device_name,
            sample_rate,
        })
    }

    /// Most recent metered level in [0, 1]
    pub fn level(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn store_level(meter: &AtomicU32, rms: f32) {
    meter.store(meter_level(rms).to_bits(), Ordering::Relaxed);
}

/// Scale an RMS value into the meter's [0, 1] range
pub fn meter_level(rms: f32) -> f32 {
    (rms * LEVEL_GAIN).clamp(0.0, 1.0)
}

/// Root mean square of a block; 0.0 for an empty block
pub fn rms(samples: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = samples.fold((0.0f32, 0usize), |(sum, n), s| (sum + s * s, n + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f32).sqrt()
    }
}
