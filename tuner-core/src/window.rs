//! # Sample Window Assembler
//!
//! Accumulates raw 16-bit little-endian PCM bytes coming from the audio
//! callback until one analysis window is full, then converts exactly that
//! many bytes into normalized `f32` samples.
//!
//! By default whatever arrived past the window boundary in the same push is
//! thrown away ([`RemainderPolicy::Discard`]). This produces short periodic
//! gaps in the analysed signal. [`RemainderPolicy::Carry`] keeps the overflow
//! for the next window instead, capped below one window so the buffer stays
//! bounded no matter how far behind the consumer falls.

use serde::Deserialize;

/// Bytes per 16-bit sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Number of samples per analysis window (8192 raw bytes).
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// What happens to bytes left over after a window has been cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Clear the whole accumulation buffer after each window.
    #[default]
    Discard,
    /// Keep the overflow (bounded) as the start of the next window.
    Carry,
}

/// A full window of samples in [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisWindow {
    samples: Vec<f32>,
}

impl AnalysisWindow {
    /// Converts little-endian `i16` bytes into normalized samples.
    /// A trailing odd byte is ignored.
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Running counters. The session logs them with every analysed window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub windows_emitted: u64,
    pub bytes_discarded: u64,
}

/// Turns an arbitrary stream of byte chunks into fixed-size windows.
#[derive(Debug)]
pub struct SampleWindowAssembler {
    buffer: Vec<u8>,
    window_bytes: usize,
    policy: RemainderPolicy,
    stats: AssemblerStats,
}

impl SampleWindowAssembler {
    /// Creates an assembler producing windows of `window_size` samples.
    pub fn new(window_size: usize, policy: RemainderPolicy) -> Self {
        let window_bytes = window_size * BYTES_PER_SAMPLE;
        Self {
            buffer: Vec::with_capacity(window_bytes * 2),
            window_bytes,
            policy,
            stats: AssemblerStats::default(),
        }
    }

    /// Appends a chunk and returns a window once enough bytes have arrived.
    /// Never returns more than one window per call.
    pub fn push(&mut self, chunk: &[u8]) -> Option<AnalysisWindow> {
        self.buffer.extend_from_slice(chunk);
        if self.buffer.len() < self.window_bytes {
            return None;
        }

        let window = AnalysisWindow::from_le_bytes(&self.buffer[..self.window_bytes]);
        self.stats.windows_emitted += 1;

        match self.policy {
            RemainderPolicy::Discard => {
                let dropped = self.buffer.len() - self.window_bytes;
                self.buffer.clear();
                self.record_discard(dropped);
            }
            RemainderPolicy::Carry => {
                self.buffer.drain(..self.window_bytes);
                // Keep the newest bytes, strictly less than one window,
                // aligned to whole samples.
                let limit = self.window_bytes - BYTES_PER_SAMPLE;
                if self.buffer.len() > limit {
                    let excess = (self.buffer.len() - limit)
                        .next_multiple_of(BYTES_PER_SAMPLE)
                        .min(self.buffer.len());
                    self.buffer.drain(..excess);
                    self.record_discard(excess);
                    // Carry only overflows when the consumer falls behind.
                    tracing::warn!(
                        dropped = excess,
                        total = self.stats.bytes_discarded,
                        "audio backlog exceeded one window, dropping oldest bytes"
                    );
                }
            }
        }

        Some(window)
    }

    /// Bytes currently waiting for the next window.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn window_bytes(&self) -> usize {
        self.window_bytes
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    fn record_discard(&mut self, dropped: usize) {
        if dropped > 0 {
            self.stats.bytes_discarded += dropped as u64;
            tracing::trace!(
                dropped,
                total = self.stats.bytes_discarded,
                "discarded bytes past window boundary"
            );
        }
    }
}
