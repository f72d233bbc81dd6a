//! # Pitch Detection Module
//!
//! The tuner treats fundamental-frequency estimation as a pluggable
//! capability: anything implementing [`PitchEstimator`] can be handed to a
//! session. [`YinEstimator`] is the default, a YIN implementation tuned for
//! plucked strings.
//!
//! ## Features
//! - Noise gate on RMS amplitude
//! - FFT-based difference function (see [`crate::fft`])
//! - First-dip search to avoid octave errors
//! - Clarity check to reject noise
//! - Parabolic interpolation for sub-sample accuracy

use crate::fft::{Autocorrelator, remove_dc_offset};
use crate::window::AnalysisWindow;

/// Estimates the fundamental frequency of one analysis window.
///
/// Implementations must be deterministic per window. They may keep scratch
/// buffers, but no state that changes the result for later windows.
pub trait PitchEstimator: Send {
    /// Returns the fundamental in Hz, or `None` if no pitch was found.
    fn estimate(&mut self, window: &AnalysisWindow) -> Option<f64>;
}

impl<F> PitchEstimator for F
where
    F: FnMut(&AnalysisWindow) -> Option<f64> + Send,
{
    fn estimate(&mut self, window: &AnalysisWindow) -> Option<f64> {
        self(window)
    }
}

/// Minimum RMS amplitude for pitch detection.
pub const DEFAULT_AMPLITUDE_THRESHOLD: f32 = 0.01;

/// A clear tone has a very low value in the normalised difference function.
const CLARITY_THRESHOLD: f64 = 0.1;

/// Margin above the global minimum that still counts as "the first dip".
const DIP_MARGIN: f64 = 0.05;

/// YIN pitch detector, configured once with the stream sample rate.
pub struct YinEstimator {
    sample_rate: u32,
    amplitude_threshold: f32,
    correlator: Option<Autocorrelator>,
}

impl YinEstimator {
    pub fn new(sample_rate: u32, amplitude_threshold: f32) -> Self {
        Self {
            sample_rate,
            amplitude_threshold,
            correlator: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Runs YIN over `signal`.
    ///
    /// # Returns
    /// * `Some(frequency)` - Detected frequency in Hz
    /// * `None` - No pitch detected (silence, noise, or invalid signal)
    pub fn detect(&mut self, signal: &[f32]) -> Option<f64> {
        let frame_size = signal.len();
        if frame_size < 8 {
            return None;
        }
        let half = frame_size / 2;

        // --- Noise Gate: Calculate RMS to filter out silence/noise ---
        let rms = (signal.iter().map(|&s| s * s).sum::<f32>() / frame_size as f32).sqrt();
        if rms < self.amplitude_threshold {
            return None;
        }

        let mut samples: Vec<f64> = signal.iter().map(|&s| s as f64).collect();
        remove_dc_offset(&mut samples);

        // --- Step 1 & 2: Difference function ---
        // d(tau) = E(0) + E(tau) - 2 r(tau), with E(tau) the energy of
        // samples[tau..tau + half].
        if self.correlator.as_ref().is_none_or(|c| c.size() != frame_size) {
            self.correlator = Some(Autocorrelator::new(frame_size));
        }
        let correlation = self.correlator.as_mut()?.correlate(&samples)?;

        let mut energy_prefix = Vec::with_capacity(frame_size + 1);
        energy_prefix.push(0.0);
        let mut acc = 0.0;
        for &s in &samples {
            acc += s * s;
            energy_prefix.push(acc);
        }
        let energy = |tau: usize| energy_prefix[tau + half] - energy_prefix[tau];

        let mut yin_buffer = vec![0.0; half];
        for tau in 1..half {
            yin_buffer[tau] = (energy(0) + energy(tau) - 2.0 * correlation[tau]).max(0.0);
        }

        // --- Step 3: Cumulative mean normalized difference ---
        let mut running_sum = 0.0;
        yin_buffer[0] = 1.0;
        for tau in 1..half {
            running_sum += yin_buffer[tau];
            if running_sum != 0.0 {
                yin_buffer[tau] *= tau as f64 / running_sum;
            } else {
                yin_buffer[tau] = 1.0;
            }
        }

        // --- Step 4 & 5: Find the first significant dip to avoid octave errors ---
        let min_val = yin_buffer
            .iter()
            .skip(1)
            .cloned()
            .fold(f64::INFINITY, f64::min);
        let threshold = min_val + DIP_MARGIN;

        let mut period = (2..half)
            .find(|&tau| yin_buffer[tau] < threshold && yin_buffer[tau] < yin_buffer[tau - 1])?;
        // Slide down to the bottom of that dip.
        while period + 1 < half && yin_buffer[period + 1] < yin_buffer[period] {
            period += 1;
        }

        // --- Clarity Check to Reject Noise ---
        if yin_buffer[period] > CLARITY_THRESHOLD {
            return None;
        }

        // --- Step 6: Parabolic interpolation for better precision ---
        if period + 1 >= half {
            return None;
        }
        let y1 = yin_buffer[period - 1];
        let y2 = yin_buffer[period];
        let y3 = yin_buffer[period + 1];

        let denominator = y1 - 2.0 * y2 + y3;
        let period_float = if denominator != 0.0 {
            period as f64 + (y1 - y3) / (2.0 * denominator)
        } else {
            period as f64
        };

        let frequency = self.sample_rate as f64 / period_float;
        if frequency.is_finite() && frequency > 0.0 {
            Some(frequency)
        } else {
            None
        }
    }
}

impl PitchEstimator for YinEstimator {
    fn estimate(&mut self, window: &AnalysisWindow) -> Option<f64> {
        self.detect(window.samples())
    }
}
