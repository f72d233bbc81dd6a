//! Error types for the tuner core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TunerError>;

#[derive(Error, Debug)]
pub enum TunerError {
    #[error("invalid note: {0}")]
    InvalidNote(String),

    #[error("invalid frequency: {0} Hz")]
    InvalidFrequency(f64),

    #[error("audio device error: {0}")]
    Device(String),

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("session has already been stopped")]
    SessionStopped,

    #[error("could not parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TunerError {
    pub fn device<S: Into<String>>(msg: S) -> Self {
        Self::Device(msg.into())
    }

    pub fn stream<S: Into<String>>(msg: S) -> Self {
        Self::Stream(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
