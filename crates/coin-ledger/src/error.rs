//! Ledger Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors from the coin ledger and payment settlement paths
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No verified caller identity on a user-facing mutation
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Debit would take the balance below zero; nothing was mutated
    #[error("Insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: u64, requested: u64 },

    /// Internal credential missing or mismatched
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Required field missing or out of range
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload did not match the expected event schema
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            LedgerError::Unauthenticated(_) => "Please sign in first.",
            LedgerError::InsufficientBalance { .. } => {
                "Not enough coins. Purchase more to continue."
            }
            LedgerError::Stripe(_) => "Payment processing failed. Please try again.",
            LedgerError::InvalidParameters(_) => "The request was missing required fields.",
            LedgerError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}
