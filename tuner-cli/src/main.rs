//! # Tuner - Terminal Guitar Tuner
//!
//! Listens to the default (or chosen) microphone and shows, for every
//! analysis window, which string is being played and how far it is from
//! standard tuning.
//!
//! ## Architecture
//! - **Audio Thread**: the CPAL callback assembles windows, estimates the
//!   pitch and redraws the terminal, all synchronously
//! - **Main Thread**: owns the session and waits for either a termination
//!   signal or a stream failure
//! - **Communication**: crossbeam channels for signals and session events

mod args;
mod display;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tuner_core::audio::{CpalSource, list_input_devices};
use tuner_core::notes::{frequency_to_note, note_to_frequency};
use tuner_core::{Session, TunerConfig, YinEstimator};

use args::{Args, Command};
use display::TerminalDisplay;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout only carries tuner frames.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    match &args.command {
        Some(Command::Devices) => {
            for (i, name) in list_input_devices()?.iter().enumerate() {
                let marker = if i == 0 { " (default)" } else { "" };
                println!("{}{}", name, marker);
            }
            Ok(())
        }
        Some(Command::Note { name }) => {
            println!("{}: {:.2} Hz", name, note_to_frequency(name)?);
            Ok(())
        }
        Some(Command::Freq { hz }) => {
            println!("{:.2} Hz: {}", hz, frequency_to_note(*hz)?);
            Ok(())
        }
        None => listen(args.load_config()?),
    }
}

/// Runs the live tuner until a termination signal or a stream failure.
fn listen(config: TunerConfig) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("failed to register signal handler")?;

    let estimator = YinEstimator::new(config.sample_rate, config.amplitude_threshold);
    let mut session = Session::new(
        CpalSource::new(config.device.clone()),
        &config,
        Box::new(estimator),
        Box::new(TerminalDisplay::stdout()),
    );
    let events = session.events();

    tracing::info!(?config, "starting tuner");
    session.start().context("failed to start the tuner")?;

    crossbeam_channel::select! {
        recv(shutdown_rx) -> _ => {
            tracing::info!("termination signal received");
            session.stop();
            Ok(())
        }
        recv(events) -> event => match event {
            Ok(event) => session.handle_event(event).context("tuner stopped"),
            Err(_) => {
                session.stop();
                Ok(())
            }
        },
    }
}
