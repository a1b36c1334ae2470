//! Error types for board analysis.

use blockpilot_images::ImageError;
use thiserror::Error;

/// Result type for board analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur while analyzing a board screenshot or game state.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The chat model request failed.
    #[error("provider request failed: {0}")]
    Provider(String),

    /// The request did not complete within the configured timeout.
    #[error("provider request timed out after {0} seconds")]
    Timeout(u64),

    /// The screenshot payload is not an acceptable image.
    #[error("invalid image payload: {0}")]
    InvalidPayload(String),

    /// An upstream image pipeline error.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AnalysisError {
    fn from(err: serde_yaml::Error) -> Self {
        AnalysisError::Config(err.to_string())
    }
}
