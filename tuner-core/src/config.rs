//! Tuner settings, loadable from a TOML file.
//!
//! Every field has a default, so an empty file (or no file) gives the
//! standard setup: 44.1 kHz, 4096-sample windows, a 50-character meter.

use serde::Deserialize;
use std::path::Path;

use crate::audio::SAMPLE_RATE;
use crate::error::{Result, TunerError};
use crate::meter::DEFAULT_METER_WIDTH;
use crate::pitch::DEFAULT_AMPLITUDE_THRESHOLD;
use crate::window::{DEFAULT_WINDOW_SIZE, RemainderPolicy};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TunerConfig {
    pub sample_rate: u32,
    /// Samples per analysis window
    pub window_size: usize,
    /// Meter width in characters
    pub meter_width: usize,
    /// RMS below which a window is treated as silence
    pub amplitude_threshold: f32,
    pub remainder: RemainderPolicy,
    /// Input device name, `None` for the system default
    pub device: Option<String>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            window_size: DEFAULT_WINDOW_SIZE,
            meter_width: DEFAULT_METER_WIDTH,
            amplitude_threshold: DEFAULT_AMPLITUDE_THRESHOLD,
            remainder: RemainderPolicy::Discard,
            device: None,
        }
    }
}

impl TunerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TunerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(TunerError::invalid_config("sample_rate must be positive"));
        }
        if self.window_size < 8 {
            return Err(TunerError::invalid_config("window_size must be at least 8 samples"));
        }
        if self.meter_width < 3 {
            return Err(TunerError::invalid_config("meter_width must be at least 3"));
        }
        if self.amplitude_threshold.is_nan() || self.amplitude_threshold < 0.0 {
            return Err(TunerError::invalid_config("amplitude_threshold must be non-negative"));
        }
        Ok(())
    }
}
