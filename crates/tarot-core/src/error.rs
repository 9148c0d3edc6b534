//! Error Types

use thiserror::Error;

/// Result type alias for reading operations
pub type Result<T> = std::result::Result<T, FortuneError>;

/// Errors from the reading flow and interpretation providers
#[derive(Error, Debug)]
pub enum FortuneError {
    /// Interpretation provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Reading request failed validation
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// Parse error (e.g., malformed stream frame)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FortuneError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            FortuneError::Provider(_) | FortuneError::ProviderUnavailable(_) => {
                "The reading could not be completed. Please try again.".into()
            }
            FortuneError::InvalidReading(msg) => format!("Invalid reading: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
