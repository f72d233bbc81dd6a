//! # Fast Fourier Transform (FFT) Module
//!
//! FFT helpers for the default pitch estimator. The YIN difference function
//! needs the autocorrelation of the window at every lag; computing it
//! directly is quadratic in the window length, so it is done here with a
//! forward/inverse FFT pair instead.
//!
//! ## Features
//! - High-performance FFT using RustFFT, planned once per window size
//! - DC offset removal for accurate analysis

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Removes the DC offset from a signal by making its average value zero.
///
/// DC offset can cause issues in frequency analysis by introducing
/// a large component at 0 Hz. This function centers the signal
/// around zero.
///
/// # Arguments
/// * `signal` - Audio signal to process (modified in-place)
pub fn remove_dc_offset(signal: &mut [f64]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f64>() / len as f64;
    if avg.abs() > 1e-9 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Computes `r(tau) = sum_{i < W} x[i] * x[i + tau]` for `tau < W`,
/// where `W` is half the planned signal length.
pub struct Autocorrelator {
    size: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    head: Vec<Complex<f64>>,
    full: Vec<Complex<f64>>,
}

impl Autocorrelator {
    /// Plans the transforms for signals of exactly `size` samples.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            size,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
            head: Vec::with_capacity(size),
            full: Vec::with_capacity(size),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `size / 2` correlation values, or `None` when the signal
    /// length does not match the planned size.
    pub fn correlate(&mut self, signal: &[f64]) -> Option<Vec<f64>> {
        if signal.len() != self.size {
            return None;
        }
        let half = self.size / 2;

        // Lags stay below `size`, so circular correlation equals linear here.
        self.head.clear();
        self.head.extend(signal.iter().enumerate().map(|(i, &s)| Complex {
            re: if i < half { s } else { 0.0 },
            im: 0.0,
        }));
        self.full.clear();
        self.full
            .extend(signal.iter().map(|&s| Complex { re: s, im: 0.0 }));

        self.forward.process(&mut self.head);
        self.forward.process(&mut self.full);

        for (h, f) in self.head.iter().zip(self.full.iter_mut()) {
            *f *= h.conj();
        }
        self.inverse.process(&mut self.full);

        // rustfft leaves the inverse transform unnormalised.
        let scale = self.size as f64;
        Some(self.full.iter().take(half).map(|c| c.re / scale).collect())
    }
}
