//! Notification error types

use common::Email;
use thiserror::Error;

/// Errors that can occur while delivering a message
#[derive(Error, Debug, Clone)]
pub enum NotifyError {
    /// The relay could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// The relay answered with a non-success status
    #[error("Message to {recipient} rejected with status {status}: {body}")]
    Rejected {
        recipient: Email,
        status: u16,
        body: String,
    },

    /// The send did not complete in time
    #[error("Message to {recipient} timed out after {seconds}s")]
    Timeout { recipient: Email, seconds: u64 },

    /// Recipient address is unusable
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Mailer misconfigured
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Transport(e.to_string())
    }
}
