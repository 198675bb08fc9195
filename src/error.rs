use std::time::Duration;
use thiserror::Error;

/// Failures of the network collaborators. These never reach the host page:
/// the link scanner turns every variant into a fallback verdict.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Service returned HTTP {0}")]
    Status(u16),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed service response: {0}")]
    Decode(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),
}
