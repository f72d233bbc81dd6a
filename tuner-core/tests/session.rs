use std::sync::{Arc, Mutex};

use tuner_core::audio::{AudioSource, DataHandler, ErrorHandler, StreamFormat};
use tuner_core::meter::{NO_SIGNAL_TEXT, verdict_text};
use tuner_core::pitch::DEFAULT_AMPLITUDE_THRESHOLD;
use tuner_core::{
    AnalysisWindow, Frame, Pipeline, PitchEstimator, RemainderPolicy, Session, SessionEvent,
    SessionState, TunerConfig, TunerError, TuningVerdict, YinEstimator,
};

const WINDOW_BYTES: usize = 4096 * 2;

#[derive(Default)]
struct SourceState {
    on_data: Option<DataHandler>,
    on_error: Option<ErrorHandler>,
    format: Option<StreamFormat>,
    opens: usize,
    closes: usize,
    fail_open: bool,
}

/// In-memory audio source; the test pushes chunks through a shared handle.
#[derive(Clone, Default)]
struct MemorySource(Arc<Mutex<SourceState>>);

impl MemorySource {
    fn failing() -> Self {
        let source = Self::default();
        source.0.lock().unwrap().fail_open = true;
        source
    }

    fn feed(&self, chunk: &[u8]) {
        if let Some(handler) = self.0.lock().unwrap().on_data.as_mut() {
            handler(chunk);
        }
    }

    fn fail(&self, message: &str) {
        if let Some(handler) = self.0.lock().unwrap().on_error.as_mut() {
            handler(TunerError::stream(message));
        }
    }

    fn opens(&self) -> usize {
        self.0.lock().unwrap().opens
    }

    fn closes(&self) -> usize {
        self.0.lock().unwrap().closes
    }
}

impl AudioSource for MemorySource {
    fn open(
        &mut self,
        format: StreamFormat,
        on_data: DataHandler,
        on_error: ErrorHandler,
    ) -> tuner_core::Result<()> {
        let mut state = self.0.lock().unwrap();
        if state.fail_open {
            return Err(TunerError::device("no microphone"));
        }
        state.opens += 1;
        state.format = Some(format);
        state.on_data = Some(on_data);
        state.on_error = Some(on_error);
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.0.lock().unwrap();
        state.closes += 1;
        state.on_data = None;
        state.on_error = None;
    }

    fn is_open(&self) -> bool {
        self.0.lock().unwrap().on_data.is_some()
    }
}

type Frames = Arc<Mutex<Vec<Frame>>>;

fn recording_sink() -> (Frames, Box<dyn tuner_core::FrameSink>) {
    let frames: Frames = Arc::default();
    let sink_frames = Arc::clone(&frames);
    let sink = Box::new(move |frame: &Frame| -> std::io::Result<()> {
        sink_frames.lock().unwrap().push(frame.clone());
        Ok(())
    });
    (frames, sink)
}

fn fixed(frequency: Option<f64>) -> Box<dyn PitchEstimator> {
    Box::new(move |_: &AnalysisWindow| frequency)
}

fn session_with(
    estimator: Box<dyn PitchEstimator>,
) -> (Session<MemorySource>, MemorySource, Frames) {
    let source = MemorySource::default();
    let (frames, sink) = recording_sink();
    let session = Session::new(source.clone(), &TunerConfig::default(), estimator, sink);
    (session, source, frames)
}

fn feed_in_chunks(source: &MemorySource, total: usize, chunk: usize) {
    let bytes = vec![0u8; total];
    for piece in bytes.chunks(chunk) {
        source.feed(piece);
    }
}

#[test]
fn in_tune_low_e() {
    let (mut session, source, frames) = session_with(fixed(Some(82.41)));
    session.start().unwrap();
    assert_eq!(session.state(), SessionState::Running);

    feed_in_chunks(&source, WINDOW_BYTES - 1, 1024);
    assert!(frames.lock().unwrap().is_empty());

    source.feed(&[0]);
    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 1);
    let lines = frames[0].lines();
    assert_eq!(lines[1], "String:    6th string (E2, 82.41 Hz)");
    assert_eq!(lines[2], "Cents:     0.0");
    assert_eq!(lines[4], verdict_text(TuningVerdict::InTune));
}

#[test]
fn sharp_low_e_pins_the_needle_right() {
    let (mut session, source, frames) = session_with(fixed(Some(87.3)));
    session.start().unwrap();
    source.feed(&vec![0u8; WINDOW_BYTES]);

    let frames = frames.lock().unwrap();
    let lines = frames[0].lines();
    assert!(lines[1].contains("6th string"));
    assert_eq!(lines[4], verdict_text(TuningVerdict::Sharp));

    let meter: Vec<char> = lines[3].chars().collect();
    assert_eq!(meter.len(), 50);
    let needle = meter.iter().position(|&c| c == '█').unwrap();
    assert!(needle >= 38, "needle at {needle}");
}

#[test]
fn missing_pitch_renders_no_signal() {
    let (mut session, source, frames) = session_with(fixed(None));
    session.start().unwrap();
    source.feed(&vec![0u8; WINDOW_BYTES]);

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 1);
    assert!(!frames[0].is_signal());
    assert_eq!(frames[0].lines(), [NO_SIGNAL_TEXT.to_string()]);
}

#[test]
fn out_of_band_pitch_renders_no_signal() {
    let (mut session, source, frames) = session_with(fixed(Some(2500.0)));
    session.start().unwrap();
    source.feed(&vec![0u8; WINDOW_BYTES]);
    assert!(!frames.lock().unwrap()[0].is_signal());
}

#[test]
fn frames_follow_window_order() {
    let mut estimates = vec![Some(110.0), None, Some(329.63)].into_iter();
    let estimator: Box<dyn PitchEstimator> =
        Box::new(move |_: &AnalysisWindow| estimates.next().flatten());
    let (mut session, source, frames) = session_with(estimator);
    session.start().unwrap();

    for _ in 0..3 {
        feed_in_chunks(&source, WINDOW_BYTES, 3000);
    }

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 3);
    assert!(frames[0].lines()[1].contains("A2"));
    assert!(!frames[1].is_signal());
    assert!(frames[2].lines()[1].contains("1st string"));
}

#[test]
fn overflow_past_a_window_is_dropped() {
    let (mut session, source, frames) = session_with(fixed(Some(110.0)));
    session.start().unwrap();

    source.feed(&vec![0u8; WINDOW_BYTES + 100]);
    assert_eq!(frames.lock().unwrap().len(), 1);

    // The extra 100 bytes were not kept, so this is still one short.
    source.feed(&vec![0u8; WINDOW_BYTES - 100]);
    assert_eq!(frames.lock().unwrap().len(), 1);
    source.feed(&vec![0u8; 100]);
    assert_eq!(frames.lock().unwrap().len(), 2);
}

#[test]
fn start_and_stop_are_idempotent() {
    let (mut session, source, _frames) = session_with(fixed(None));
    session.start().unwrap();
    session.start().unwrap();
    assert_eq!(source.opens(), 1);
    assert_eq!(
        source.0.lock().unwrap().format,
        Some(StreamFormat { sample_rate: 44_100, channels: 1 })
    );

    session.stop();
    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(source.closes(), 1);
    assert!(!source.is_open());

    assert!(matches!(session.start(), Err(TunerError::SessionStopped)));
}

#[test]
fn stop_before_start_is_terminal() {
    let (mut session, source, _frames) = session_with(fixed(None));
    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.start().is_err());
    assert_eq!(source.opens(), 0);
}

#[test]
fn stream_error_stops_the_session() {
    let (mut session, source, frames) = session_with(fixed(Some(110.0)));
    let events = session.events();
    session.start().unwrap();

    source.fail("device unplugged");
    let event = events.try_recv().expect("error event");
    assert!(matches!(event, SessionEvent::StreamError(_)));

    let result = session.handle_event(event);
    assert!(matches!(result, Err(TunerError::Stream(_))));
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(!source.is_open());

    source.feed(&vec![0u8; WINDOW_BYTES]);
    assert!(frames.lock().unwrap().is_empty());
}

#[test]
fn sink_failure_is_reported() {
    let source = MemorySource::default();
    let sink = Box::new(|_: &Frame| -> std::io::Result<()> {
        Err(std::io::Error::other("terminal gone"))
    });
    let mut session = Session::new(source.clone(), &TunerConfig::default(), fixed(None), sink);
    let events = session.events();
    session.start().unwrap();

    source.feed(&vec![0u8; WINDOW_BYTES]);
    let event = events.try_recv().expect("pipeline event");
    assert!(matches!(event, SessionEvent::PipelineError(TunerError::Io(_))));
    assert!(session.handle_event(event).is_err());
}

#[test]
fn open_failure_is_surfaced() {
    let source = MemorySource::failing();
    let (_frames, sink) = recording_sink();
    let mut session = Session::new(source, &TunerConfig::default(), fixed(None), sink);
    assert!(matches!(session.start(), Err(TunerError::Device(_))));
    assert_eq!(session.state(), SessionState::Stopped);
}

#[test]
fn yin_pipeline_tunes_a_synthetic_a_string() {
    let config = TunerConfig {
        remainder: RemainderPolicy::Carry,
        ..TunerConfig::default()
    };
    let (frames, sink) = recording_sink();
    let estimator = Box::new(YinEstimator::new(config.sample_rate, DEFAULT_AMPLITUDE_THRESHOLD));
    let mut pipeline = Pipeline::new(&config, estimator, sink);

    let bytes: Vec<u8> = (0..config.window_size)
        .map(|i| {
            let t = i as f64 / config.sample_rate as f64;
            (0.5 * (2.0 * std::f64::consts::PI * 110.0 * t).sin() * 32767.0) as i16
        })
        .flat_map(|s| s.to_le_bytes())
        .collect();

    let frame = pipeline.process_chunk(&bytes).unwrap().expect("full window");
    assert!(frame.lines()[1].contains("5th string"), "{frame}");
    assert_eq!(frame.lines()[4], verdict_text(TuningVerdict::InTune));
    assert_eq!(frames.lock().unwrap().len(), 1);
    assert_eq!(pipeline.assembler().stats().windows_emitted, 1);
}

#[test]
fn pipeline_counts_windows_and_dropped_bytes() {
    let config = TunerConfig::default();
    let (frames, sink) = recording_sink();
    let mut pipeline = Pipeline::new(&config, fixed(Some(110.0)), sink);
    assert_eq!(pipeline.assembler().window_bytes(), WINDOW_BYTES);

    assert!(pipeline.process_chunk(&vec![0u8; WINDOW_BYTES + 100]).unwrap().is_some());
    assert!(pipeline.process_chunk(&vec![0u8; WINDOW_BYTES]).unwrap().is_some());

    let stats = pipeline.assembler().stats();
    assert_eq!(stats.windows_emitted, 2);
    assert_eq!(stats.bytes_discarded, 100);
    assert_eq!(frames.lock().unwrap().len(), 2);
}
