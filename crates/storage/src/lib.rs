//! Table store abstractions for Coffee Carousel
//!
//! The carousel keeps its subscribers and pairing history in a
//! spreadsheet. This crate hides that behind the [`TableStore`] trait with
//! two implementations:
//!
//! - [`InMemoryTableStore`] - fast, non-persistent (tests, dry runs)
//! - [`SheetsTableStore`] - Google Sheets values API over HTTP

pub mod error;
mod memory;
mod sheets;
mod traits;

pub use error::StorageError;
pub use memory::InMemoryTableStore;
pub use sheets::SheetsTableStore;
pub use traits::*;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
