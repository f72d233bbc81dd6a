// tuner-core/src/lib.rs

//! The core logic for the guitar tuner.
//! This crate is responsible for audio capture, window assembly, pitch
//! detection, string matching and meter rendering. It is completely
//! headless; the terminal surface lives in the CLI crate.

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod meter;
pub mod notes;
pub mod pitch;
pub mod reference;
pub mod session;
pub mod tuning;
pub mod window;

pub use config::TunerConfig;
pub use error::{Result, TunerError};
pub use meter::{Frame, MeterRenderer};
pub use pitch::{PitchEstimator, YinEstimator};
pub use reference::{ReferenceString, STANDARD_TUNING};
pub use session::{FrameSink, Pipeline, Session, SessionEvent, SessionState};
pub use tuning::{TuningEngine, TuningResult, TuningVerdict};
pub use window::{AnalysisWindow, RemainderPolicy, SampleWindowAssembler};
