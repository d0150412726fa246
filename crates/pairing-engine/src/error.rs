//! Pairing engine error types

use common::Email;
use thiserror::Error;

/// Errors that can occur while building participants or pairing them
#[derive(Error, Debug)]
pub enum PairingError {
    /// Missing or malformed table data
    #[error(transparent)]
    Data(#[from] common::Error),

    /// The same subscriber appears twice in the subscriber table
    #[error("Duplicate subscriber: {0}")]
    DuplicateSubscriber(Email),

    /// The same ordered pair appears twice in the history table
    #[error("Duplicate history row: {first} -> {second}")]
    DuplicateLedgerRow { first: Email, second: Email },

    /// A pairing would break symmetry or pair someone with themselves
    #[error("Invalid pairing: {0}")]
    InvalidPairing(String),
}

impl PairingError {
    /// Returns true for errors caused by the shape of tabular input
    pub fn is_data_shape(&self) -> bool {
        match self {
            PairingError::Data(e) => e.is_data_shape(),
            PairingError::DuplicateSubscriber(_) | PairingError::DuplicateLedgerRow { .. } => true,
            PairingError::InvalidPairing(_) => false,
        }
    }
}
