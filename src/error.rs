//! TTS Tester Error Types
//!
//! Centralized error handling for the tester.

use thiserror::Error;

/// Central error type for the TTS tester
#[derive(Error, Debug)]
pub enum TesterError {
    #[error("TTS engine error: {0}")]
    Tts(String),

    #[error("Audio playback error: {0}")]
    Audio(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speaker tag store error: {0}")]
    TagStore(String),

    #[error("External process error: {0}")]
    Process(String),

    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for tester operations
pub type TesterResult<T> = Result<T, TesterError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for TesterError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        TesterError::Lock(err.to_string())
    }
}
