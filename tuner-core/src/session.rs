//! # Session Controller
//!
//! Owns the audio stream and drives the analysis pipeline from inside the
//! stream's data callback:
//!
//! raw bytes -> [`SampleWindowAssembler`] -> [`PitchEstimator`] ->
//! [`TuningEngine`] -> [`MeterRenderer`] -> [`FrameSink`]
//!
//! Everything for one chunk runs synchronously before the callback returns,
//! so windows are rendered strictly in arrival order and the sink always
//! holds the newest frame. Failures raised on the audio thread are sent
//! back to the owner of the session as [`SessionEvent`]s; only the owner
//! closes the stream.

use crossbeam_channel::{Receiver, Sender};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::audio::{AudioSource, StreamFormat};
use crate::config::TunerConfig;
use crate::error::{Result, TunerError};
use crate::meter::{Frame, MeterRenderer};
use crate::pitch::PitchEstimator;
use crate::tuning::{TuningEngine, TuningResult};
use crate::window::SampleWindowAssembler;

/// Display surface. Each frame replaces the previous one.
pub trait FrameSink: Send {
    fn show(&mut self, frame: &Frame) -> io::Result<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(&Frame) -> io::Result<()> + Send,
{
    fn show(&mut self, frame: &Frame) -> io::Result<()> {
        self(frame)
    }
}

/// Everything that happens to one chunk of audio.
pub struct Pipeline {
    assembler: SampleWindowAssembler,
    estimator: Box<dyn PitchEstimator>,
    engine: TuningEngine,
    renderer: MeterRenderer,
    sink: Box<dyn FrameSink>,
}

impl Pipeline {
    pub fn new(
        config: &TunerConfig,
        estimator: Box<dyn PitchEstimator>,
        sink: Box<dyn FrameSink>,
    ) -> Self {
        Self {
            assembler: SampleWindowAssembler::new(config.window_size, config.remainder),
            estimator,
            engine: TuningEngine::default(),
            renderer: MeterRenderer::new(config.meter_width),
            sink,
        }
    }

    /// Feeds one chunk. When it completes a window, the window is analysed,
    /// shown on the sink, and the rendered frame is returned.
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Result<Option<Frame>> {
        let Some(window) = self.assembler.push(chunk) else {
            return Ok(None);
        };

        let frequency = self.estimator.estimate(&window);
        let result: Option<TuningResult> = self.engine.evaluate(frequency);
        let stats = self.assembler.stats();
        match &result {
            Some(r) => tracing::debug!(
                frequency = r.frequency,
                string = r.reference.name,
                cents = r.cents,
                windows = stats.windows_emitted,
                bytes_discarded = stats.bytes_discarded,
                "window analysed"
            ),
            None => tracing::debug!(
                ?frequency,
                windows = stats.windows_emitted,
                bytes_discarded = stats.bytes_discarded,
                "window without usable pitch"
            ),
        }

        let frame = self.renderer.render(result.as_ref());
        self.sink.show(&frame)?;
        Ok(Some(frame))
    }

    pub fn assembler(&self) -> &SampleWindowAssembler {
        &self.assembler
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    /// Terminal; build a new session to listen again.
    Stopped,
}

/// Raised on the audio thread, handled by the session owner.
#[derive(Debug)]
pub enum SessionEvent {
    /// The audio device or driver reported a failure.
    StreamError(TunerError),
    /// The pipeline failed, e.g. the display could not be written.
    PipelineError(TunerError),
}

pub struct Session<S: AudioSource> {
    source: S,
    format: StreamFormat,
    pipeline: Option<Pipeline>,
    state: SessionState,
    active: Arc<AtomicBool>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl<S: AudioSource> Session<S> {
    pub fn new(
        source: S,
        config: &TunerConfig,
        estimator: Box<dyn PitchEstimator>,
        sink: Box<dyn FrameSink>,
    ) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            source,
            format: StreamFormat {
                sample_rate: config.sample_rate,
                channels: 1,
            },
            pipeline: Some(Pipeline::new(config, estimator, sink)),
            state: SessionState::Idle,
            active: Arc::new(AtomicBool::new(false)),
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Failures reported from the audio thread. Pass them to
    /// [`Session::handle_event`].
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events_rx.clone()
    }

    /// Opens the stream and starts analysing. Does nothing if already running.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Running => return Ok(()),
            SessionState::Stopped => return Err(TunerError::SessionStopped),
            SessionState::Idle => {}
        }
        let mut pipeline = self.pipeline.take().ok_or(TunerError::SessionStopped)?;

        self.active.store(true, Ordering::Release);

        let active = Arc::clone(&self.active);
        let events = self.events_tx.clone();
        let on_data = Box::new(move |chunk: &[u8]| {
            if !active.load(Ordering::Acquire) {
                return;
            }
            if let Err(e) = pipeline.process_chunk(chunk) {
                active.store(false, Ordering::Release);
                let _ = events.send(SessionEvent::PipelineError(e));
            }
        });

        let active = Arc::clone(&self.active);
        let events = self.events_tx.clone();
        let on_error = Box::new(move |err: TunerError| {
            active.store(false, Ordering::Release);
            let _ = events.send(SessionEvent::StreamError(err));
        });

        self.state = SessionState::Running;
        if let Err(e) = self.source.open(self.format, on_data, on_error) {
            tracing::error!("failed to open audio stream: {}", e);
            self.stop();
            return Err(e);
        }
        tracing::info!(sample_rate = self.format.sample_rate, "session started");
        Ok(())
    }

    /// Closes the stream if open. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::Release);
        if self.source.is_open() {
            self.source.close();
        }
        if self.state != SessionState::Stopped {
            tracing::info!("session stopped");
        }
        self.state = SessionState::Stopped;
    }

    /// Stops the session and returns the carried error.
    pub fn handle_event(&mut self, event: SessionEvent) -> Result<()> {
        let err = match event {
            SessionEvent::StreamError(e) => {
                tracing::error!("audio stream failed: {}", e);
                e
            }
            SessionEvent::PipelineError(e) => {
                tracing::error!("analysis pipeline failed: {}", e);
                e
            }
        };
        self.stop();
        Err(err)
    }
}

impl<S: AudioSource> Drop for Session<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
