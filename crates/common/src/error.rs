//! Common error types for Coffee Carousel

use thiserror::Error;

/// Errors about the shape of tabular data, shared by every crate that
/// decodes a [`crate::Table`]
#[derive(Error, Debug)]
pub enum Error {
    /// A required column is absent from a table header
    #[error("Missing column '{column}' in table '{table}'")]
    MissingColumn { table: String, column: String },

    /// A cell could not be interpreted
    #[error("Malformed value in table '{table}', row {row}, column '{column}': {message}")]
    MalformedCell {
        table: String,
        row: usize,
        column: String,
        message: String,
    },
}

/// Result type alias using the common Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a missing column error
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a malformed cell error. `row` is the 1-based data row index.
    pub fn malformed_cell(
        table: impl Into<String>,
        row: usize,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedCell {
            table: table.into(),
            row,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the shape of tabular input
    pub fn is_data_shape(&self) -> bool {
        matches!(self, Self::MissingColumn { .. } | Self::MalformedCell { .. })
    }
}
