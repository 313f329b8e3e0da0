//! Error types for outputs and the control surface
use thiserror::Error;

/// Control and output errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Art-Net error
    #[error("Art-Net error: {0}")]
    ArtNetError(String),

    /// Terminal output error
    #[error("Terminal error: {0}")]
    TerminalError(String),

    /// HTTP API error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<ControlError> for stripviz_core::VizError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::IoError(e) => stripviz_core::VizError::Io(e),
            ControlError::InvalidParameter(msg) => stripviz_core::VizError::InvalidConfig(msg),
            other => stripviz_core::VizError::Sink(other.to_string()),
        }
    }
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
