//! # Note Conversion Module
//!
//! Pure conversions between note names and frequencies in 12-tone equal
//! temperament with A4 = 440 Hz. These are independent of the streaming
//! pipeline and are used by the `note` / `freq` commands of the CLI.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::error::{Result, TunerError};

/// Concert pitch in Hz.
pub const A4_FREQUENCY: f64 = 440.0;

/// Absolute half-step index of A4 counted from C0.
const A4_INDEX: i32 = 9 + 4 * 12;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch-class lookup, sharps and flats, built once.
static PITCH_CLASSES: Lazy<BTreeMap<&'static str, i32>> = Lazy::new(|| {
    let mut map: BTreeMap<&'static str, i32> = NOTE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i as i32))
        .collect();
    for (flat, index) in [("Db", 1), ("Eb", 3), ("Gb", 6), ("Ab", 8), ("Bb", 10)] {
        map.insert(flat, index);
    }
    map
});

/// Parses "C#3" into its half-step index counted from C0.
fn parse_note(name: &str) -> Option<i32> {
    let trimmed = name.trim();
    let split = trimmed
        .char_indices()
        .find(|(i, c)| *i > 0 && (c.is_ascii_digit() || *c == '-'))
        .map(|(i, _)| i)?;
    let (class, octave) = trimmed.split_at(split);
    let class_index = *PITCH_CLASSES.get(class)?;
    let octave: i32 = octave.parse().ok()?;
    octave.checked_mul(12)?.checked_add(class_index)
}

/// Converts a note name such as "A4", "C#3" or "Bb2" to its frequency in Hz.
pub fn note_to_frequency(name: &str) -> Result<f64> {
    let invalid = || TunerError::InvalidNote(name.to_string());
    let half_steps = parse_note(name)
        .and_then(|index| index.checked_sub(A4_INDEX))
        .ok_or_else(invalid)?;
    let frequency = A4_FREQUENCY * 2.0_f64.powf(half_steps as f64 / 12.0);
    // Absurd octaves overflow or underflow f64.
    if frequency.is_finite() && frequency > 0.0 {
        Ok(frequency)
    } else {
        Err(invalid())
    }
}

/// Converts a frequency to the name of the nearest equal-tempered note.
pub fn frequency_to_note(frequency: f64) -> Result<String> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(TunerError::InvalidFrequency(frequency));
    }
    let half_steps = (12.0 * (frequency / A4_FREQUENCY).log2()).round() as i32;
    let index = A4_INDEX + half_steps;
    let class = NOTE_NAMES[index.rem_euclid(12) as usize];
    let octave = index.div_euclid(12);
    Ok(format!("{}{}", class, octave))
}
