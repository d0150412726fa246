//! Storage error types

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store answered with a non-success status
    #[error("Request to '{table}' failed with status {status}: {body}")]
    Status {
        table: String,
        status: u16,
        body: String,
    },

    /// Table not found
    #[error("Table not found: {0}")]
    NotFound(String),

    /// Response could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StorageError::Serialization(e.to_string())
        } else {
            StorageError::Connection(e.to_string())
        }
    }
}
