//! Carousel error types

use thiserror::Error;

/// Errors that end a carousel run
#[derive(Error, Debug)]
pub enum CarouselError {
    /// Reading or writing a table failed
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    /// Table contents could not be turned into participants, or pairing failed
    #[error(transparent)]
    Pairing(#[from] pairing_engine::PairingError),

    /// The notifier could not be built
    #[error("Notifier error: {0}")]
    Notify(#[from] notify::NotifyError),
}

impl CarouselError {
    /// Returns true when the run stopped on bad table data
    pub fn is_data_shape(&self) -> bool {
        matches!(self, CarouselError::Pairing(e) if e.is_data_shape())
    }
}
