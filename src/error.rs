use std::time::Duration;
use thiserror::Error;

/// Failure of a single analysis attempt.
///
/// Transport, HTTP and decode failures are the three kinds the service can
/// produce; they all end up as one displayed message on the session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Failed to reach analysis service: {0}")]
    Transport(String),

    #[error("Analysis service returned HTTP error (status {status})")]
    Http { status: u16 },

    #[error("Unexpected analysis response: {0}")]
    Decode(String),

    #[error("Failed to read video file: {0}")]
    FileRead(String),

    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Analysis was cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Error code for JSON output
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::Transport(_) => "TRANSPORT_ERROR",
            AnalysisError::Http { .. } => "HTTP_ERROR",
            AnalysisError::Decode(_) => "DECODE_ERROR",
            AnalysisError::FileRead(_) => "FILE_READ_ERROR",
            AnalysisError::Timeout(_) => "TIMEOUT",
            AnalysisError::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("Unsupported playback rate: {0}")]
    UnsupportedRate(f64),
}

impl PlaybackError {
    pub fn code(&self) -> &'static str {
        match self {
            PlaybackError::UnsupportedRate(_) => "UNSUPPORTED_RATE",
        }
    }
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Video file not found: {0}")]
    NotFound(String),

    #[error("Failed to inspect {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl MediaError {
    pub fn code(&self) -> &'static str {
        match self {
            MediaError::NotFound(_) => "NOT_FOUND",
            MediaError::Io { .. } => "IO_ERROR",
        }
    }
}
