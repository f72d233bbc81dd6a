//! # Reference Table
//!
//! The six target pitches of standard guitar tuning, ordered from the
//! lowest string to the highest. Order only matters for tie-breaking in
//! the nearest-string search.

/// A single target pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceString {
    /// Display label (e.g. "6th string")
    pub name: &'static str,
    /// Pitch-class label with octave (e.g. "E2")
    pub note: &'static str,
    /// Target frequency in Hz
    pub frequency: f64,
}

/// Standard tuning, E2 A2 D3 G3 B3 E4.
pub static STANDARD_TUNING: [ReferenceString; 6] = [
    ReferenceString { name: "6th string", note: "E2", frequency: 82.41 },
    ReferenceString { name: "5th string", note: "A2", frequency: 110.00 },
    ReferenceString { name: "4th string", note: "D3", frequency: 146.83 },
    ReferenceString { name: "3rd string", note: "G3", frequency: 196.00 },
    ReferenceString { name: "2nd string", note: "B3", frequency: 246.94 },
    ReferenceString { name: "1st string", note: "E4", frequency: 329.63 },
];
