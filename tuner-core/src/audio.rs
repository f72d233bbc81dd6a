//! # Audio Capture Module
//!
//! The session controller consumes audio through the [`AudioSource`]
//! contract: a stream of raw signed 16-bit little-endian mono PCM chunks
//! plus an error channel. [`CpalSource`] implements it on top of CPAL
//! (Cross-Platform Audio Library).
//!
//! ## Features
//! - Default or named input device selection
//! - Prefers native `i16` mono input; converts `f32` and multi-channel input
//! - Closing a source drops the stream, so no callback runs afterwards

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SupportedStreamConfigRange};

use crate::error::{Result, TunerError};

/// Sample rate the tuner runs at.
pub const SAMPLE_RATE: u32 = 44_100;

/// Receives every raw PCM chunk, in arrival order.
pub type DataHandler = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Receives stream failures.
pub type ErrorHandler = Box<dyn FnMut(TunerError) + Send + 'static>;

/// Shape of the requested stream. Encoding is always s16le.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: 1,
        }
    }
}

/// A producer of raw audio chunks.
pub trait AudioSource {
    /// Starts delivering chunks to `on_data` and failures to `on_error`.
    fn open(
        &mut self,
        format: StreamFormat,
        on_data: DataHandler,
        on_error: ErrorHandler,
    ) -> Result<()>;

    /// Terminates the stream. After this returns no handler is invoked again.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Microphone input through the default CPAL host.
pub struct CpalSource {
    device_name: Option<String>,
    stream: Option<cpal::Stream>,
}

impl CpalSource {
    /// `device_name` selects an input device by name; `None` uses the default.
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            stream: None,
        }
    }

    fn select_device(&self, host: &cpal::Host) -> Result<cpal::Device> {
        match &self.device_name {
            None => host
                .default_input_device()
                .ok_or_else(|| TunerError::device("No input device available")),
            Some(wanted) => host
                .input_devices()
                .map_err(|e| TunerError::device(format!("Failed to enumerate devices: {}", e)))?
                .find(|d| d.name().map(|n| &n == wanted).unwrap_or(false))
                .ok_or_else(|| TunerError::device(format!("Input device not found: {}", wanted))),
        }
    }
}

impl AudioSource for CpalSource {
    fn open(
        &mut self,
        format: StreamFormat,
        mut on_data: DataHandler,
        mut on_error: ErrorHandler,
    ) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = self.select_device(&host)?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        tracing::info!(device = %device_name, "using audio input device");

        let configs = device
            .supported_input_configs()
            .map_err(|e| TunerError::device(e.to_string()))?
            .collect::<Vec<_>>();
        let supported_config = find_supported_config(configs, format)
            .ok_or_else(|| {
                TunerError::device(format!(
                    "{} does not support {} Hz input",
                    device_name, format.sample_rate
                ))
            })?;

        let sample_format = supported_config.sample_format();
        let config: cpal::StreamConfig = supported_config
            .with_sample_rate(cpal::SampleRate(format.sample_rate))
            .into();
        let channels = config.channels as usize;
        tracing::info!(
            sample_rate = config.sample_rate.0,
            channels,
            ?sample_format,
            "opening input stream"
        );

        let err_fn = move |err: cpal::StreamError| on_error(TunerError::stream(err.to_string()));

        // Only the first channel of each frame is kept.
        let mut bytes = Vec::new();
        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    bytes.clear();
                    bytes.extend(data.iter().step_by(channels).flat_map(|&s| s.to_le_bytes()));
                    on_data(&bytes);
                },
                err_fn,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    bytes.clear();
                    bytes.extend(
                        data.iter()
                            .step_by(channels)
                            .flat_map(|&s| s.to_sample::<i16>().to_le_bytes()),
                    );
                    on_data(&bytes);
                },
                err_fn,
                None,
            ),
            other => {
                return Err(TunerError::device(format!("Unsupported sample format: {:?}", other)));
            }
        }
        .map_err(|e| TunerError::device(e.to_string()))?;

        stream.play().map_err(|e| TunerError::stream(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                tracing::warn!("error pausing stream: {}", e);
            }
            drop(stream);
            tracing::info!("input stream closed");
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Finds the best supported input configuration for `format`.
///
/// Candidates must cover the requested sample rate and deliver `i16` or
/// `f32`. Among those, the requested channel count wins first, then `i16`
/// over `f32`, then the fewest channels.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    format: StreamFormat,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| {
            c.min_sample_rate().0 <= format.sample_rate
                && c.max_sample_rate().0 >= format.sample_rate
                && matches!(c.sample_format(), SampleFormat::I16 | SampleFormat::F32)
        })
        .min_by_key(|c| {
            (
                c.channels() != format.channels,
                c.sample_format() != SampleFormat::I16,
                c.channels(),
            )
        })
}

/// Names of the available input devices, the default one first.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut names: Vec<String> = host
        .input_devices()
        .map_err(|e| TunerError::device(format!("Failed to enumerate devices: {}", e)))?
        .filter_map(|d| d.name().ok())
        .collect();
    if let Some(default_name) = default_name {
        if let Some(pos) = names.iter().position(|n| *n == default_name) {
            let name = names.remove(pos);
            names.insert(0, name);
        }
    }
    Ok(names)
}
