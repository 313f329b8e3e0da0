//! Error types for the visualization core
use thiserror::Error;

/// Visualization pipeline errors
#[derive(Error, Debug)]
pub enum VizError {
    /// Audio device missing or capture could not be started
    #[error("Audio unavailable: {0}")]
    AudioUnavailable(String),

    /// A single spectrum read failed
    #[error("Audio read error: {0}")]
    AudioRead(String),

    /// Pixel output failed
    #[error("Pixel sink error: {0}")]
    Sink(String),

    /// Channel index outside the configured strip
    #[error("Channel {index} out of range (channel count {count})")]
    ChannelOutOfRange { index: usize, count: usize },

    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Mode id not recognized
    #[error("Unknown visualization mode: {0}")]
    UnknownMode(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, VizError>;
