//! Command line arguments.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tuner_core::{RemainderPolicy, TunerConfig};

#[derive(Parser, Debug)]
#[command(name = "tuner", version, about = "Real-time guitar tuner for the terminal")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// TOML settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Input device name (see `tuner devices`)
    #[arg(long)]
    pub device: Option<String>,

    /// Samples per analysis window
    #[arg(long)]
    pub window_size: Option<usize>,

    /// Meter width in characters
    #[arg(long)]
    pub meter_width: Option<usize>,

    /// Keep audio past a window boundary for the next window
    #[arg(long)]
    pub carry_remainder: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List audio input devices
    Devices,
    /// Print the frequency of a note, e.g. `tuner note A4`
    Note { name: String },
    /// Print the nearest note to a frequency in Hz
    Freq {
        #[arg(allow_negative_numbers = true)]
        hz: f64,
    },
}

impl Args {
    /// Settings file (if any) with command line flags applied on top.
    pub fn load_config(&self) -> Result<TunerConfig> {
        let mut config = match &self.config {
            Some(path) => TunerConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => TunerConfig::default(),
        };

        if let Some(device) = &self.device {
            config.device = Some(device.clone());
        }
        if let Some(window_size) = self.window_size {
            config.window_size = window_size;
        }
        if let Some(meter_width) = self.meter_width {
            config.meter_width = meter_width;
        }
        if self.carry_remainder {
            config.remainder = RemainderPolicy::Carry;
        }

        config.validate()?;
        Ok(config)
    }
}
