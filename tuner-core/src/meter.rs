//! # Cent Meter
//!
//! Turns a [`TuningResult`] into a text frame: numeric readouts, a
//! fixed-width linear meter with a needle, and a verdict line.
//!
//! The meter spans -100..+100 cents across its width. Larger deviations
//! pin the needle to the first or last cell.

use std::fmt;

use crate::tuning::{TuningResult, TuningVerdict};

/// Default meter width in characters.
pub const DEFAULT_METER_WIDTH: usize = 50;

/// Deviation that maps to a full half-width.
const METER_RANGE_CENTS: f64 = 100.0;

const MARKER: char = '█';
const CENTER: char = '│';
const FILL: char = '─';

pub const NO_SIGNAL_TEXT: &str = "No signal detected - play a string";

/// One screenful of tuner output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<String>,
    signal: bool,
}

impl Frame {
    fn no_signal() -> Self {
        Self {
            lines: vec![NO_SIGNAL_TEXT.to_string()],
            signal: false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `false` for the "no signal" frame.
    pub fn is_signal(&self) -> bool {
        self.signal
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

pub fn verdict_text(verdict: TuningVerdict) -> &'static str {
    match verdict {
        TuningVerdict::InTune => "In tune",
        TuningVerdict::Flat => "Flat - tighten the string",
        TuningVerdict::Sharp => "Sharp - loosen the string",
    }
}

/// Signed cents with one decimal, `+` for positive values.
pub fn format_cents(cents: f64) -> String {
    if cents > 0.0 {
        format!("+{:.1}", cents)
    } else if cents == 0.0 {
        // Avoids printing "-0.0" for negative zero.
        "0.0".to_string()
    } else {
        format!("{:.1}", cents)
    }
}

/// Renders tuning results at a fixed meter width.
#[derive(Debug, Clone, Copy)]
pub struct MeterRenderer {
    width: usize,
}

impl Default for MeterRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_METER_WIDTH)
    }
}

impl MeterRenderer {
    pub fn new(width: usize) -> Self {
        Self { width: width.max(1) }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Cell that marks perfect pitch.
    pub fn center_index(&self) -> usize {
        self.width / 2
    }

    /// Needle position for `cents`, clamped into the meter.
    pub fn marker_index(&self, cents: f64) -> usize {
        let center = self.center_index() as f64;
        let raw = center + (cents / METER_RANGE_CENTS * center).floor();
        if raw.is_nan() {
            return self.center_index();
        }
        raw.clamp(0.0, (self.width - 1) as f64) as usize
    }

    /// The meter itself, exactly `width` characters.
    pub fn meter_line(&self, cents: f64) -> String {
        let marker = self.marker_index(cents);
        let center = self.center_index();
        (0..self.width)
            .map(|i| {
                if i == marker {
                    MARKER
                } else if i == center {
                    CENTER
                } else {
                    FILL
                }
            })
            .collect()
    }

    pub fn render(&self, result: Option<&TuningResult>) -> Frame {
        let Some(result) = result else {
            return Frame::no_signal();
        };
        let reference = &result.reference;
        Frame {
            lines: vec![
                format!("Frequency: {:.2} Hz", result.frequency),
                format!(
                    "String:    {} ({}, {:.2} Hz)",
                    reference.name, reference.note, reference.frequency
                ),
                format!("Cents:     {}", format_cents(result.cents)),
                self.meter_line(result.cents),
                verdict_text(result.verdict()).to_string(),
            ],
            signal: true,
        }
    }
}
