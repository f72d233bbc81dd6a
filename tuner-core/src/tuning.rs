//! # Musical Tuning Module
//!
//! Matches a detected frequency against the reference table and measures
//! how far off it is in cents.
//!
//! Cents are a logarithmic unit of pitch measurement where:
//! - 100 cents = 1 semitone
//! - 1200 cents = 1 octave
//! - Positive values indicate sharpness, negative values indicate flatness

use crate::reference::{ReferenceString, STANDARD_TUNING};

/// Deviations up to and including this many cents count as in tune.
pub const IN_TUNE_TOLERANCE_CENTS: f64 = 5.0;

/// Frequencies at or below this are treated as no signal.
pub const MIN_FREQUENCY: f64 = 50.0;

/// Frequencies at or above this are treated as no signal.
pub const MAX_FREQUENCY: f64 = 2000.0;

/// Calculates the deviation of `freq` from `target_freq` in cents.
pub fn cents(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}

/// Whether a frequency falls inside the usable (50, 2000) Hz band.
pub fn is_usable_frequency(freq: f64) -> bool {
    freq.is_finite() && freq > MIN_FREQUENCY && freq < MAX_FREQUENCY
}

/// Coarse classification of a cent deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningVerdict {
    InTune,
    /// Lower than the target; tighten the string.
    Flat,
    /// Higher than the target; loosen the string.
    Sharp,
}

impl TuningVerdict {
    pub fn classify(cents: f64) -> Self {
        if cents.abs() <= IN_TUNE_TOLERANCE_CENTS {
            TuningVerdict::InTune
        } else if cents < 0.0 {
            TuningVerdict::Flat
        } else {
            TuningVerdict::Sharp
        }
    }
}

/// The nearest reference string for one detected frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningResult {
    /// Detected frequency in Hz
    pub frequency: f64,
    /// Closest entry of the reference table
    pub reference: ReferenceString,
    /// Signed deviation from `reference`, negative = flat
    pub cents: f64,
}

impl TuningResult {
    pub fn verdict(&self) -> TuningVerdict {
        TuningVerdict::classify(self.cents)
    }
}

/// Finds the closest reference pitch for each detected frequency.
#[derive(Debug, Clone, Copy)]
pub struct TuningEngine {
    table: &'static [ReferenceString],
}

impl Default for TuningEngine {
    fn default() -> Self {
        Self::new(&STANDARD_TUNING)
    }
}

impl TuningEngine {
    pub fn new(table: &'static [ReferenceString]) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'static [ReferenceString] {
        self.table
    }

    /// Matches a detected frequency to the closest reference pitch.
    ///
    /// Returns `None` for a missing estimate or one outside the usable band.
    /// When two references are equally close the earlier one in the table
    /// wins.
    pub fn evaluate(&self, frequency: Option<f64>) -> Option<TuningResult> {
        let frequency = frequency.filter(|&f| is_usable_frequency(f))?;

        let mut best: Option<(ReferenceString, f64)> = None;
        for reference in self.table {
            let deviation = cents(frequency, reference.frequency);
            match best {
                Some((_, best_cents)) if deviation.abs() >= best_cents.abs() => {}
                _ => best = Some((*reference, deviation)),
            }
        }

        best.map(|(reference, cents)| TuningResult {
            frequency,
            reference,
            cents,
        })
    }
}
