//! Error types for the face capture pipeline.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding or buffer conversion failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The external landmark detector failed
    #[error("Landmark source error: {0}")]
    LandmarkSource(String),

    /// The video stream stopped delivering frames
    #[error("Frame source error: {0}")]
    FrameSource(String),

    /// Grabbing or encoding a still failed at the moment of capture
    #[error("Capture error: {0}")]
    Capture(String),

    /// Capture session invariant violated
    #[error("Session error: {0}")]
    Session(String),

    /// Pipeline controller used in the wrong state
    #[error("Pipeline state error: {0}")]
    PipelineState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),
}

impl Error {
    /// Whether the alignment loop may simply retry after this error.
    ///
    /// Capture failures are recoverable; a dead camera or detector is not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Capture(_) | Error::Image(_))
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
