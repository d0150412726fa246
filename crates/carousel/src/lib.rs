//! Run orchestration for Coffee Carousel
//!
//! One [`Carousel::spin`] is one run:
//!
//! 1. Read the subscriber and history tables
//! 2. Decode them (any data-shape problem stops the run here)
//! 3. Build participants and drop those outside their periodic week
//! 4. Pair them
//! 5. Reconcile and write back the history ledger
//! 6. Notify every participant of the run
//!
//! Notifications go out strictly after the ledger is committed, so a
//! failed write never leaves people told about pairs the ledger forgot.

pub mod error;
mod report;
mod runner;

pub use error::CarouselError;
pub use report::RunReport;
pub use runner::{build_notifier, build_store, Carousel};

/// Result type for carousel runs
pub type Result<T> = std::result::Result<T, CarouselError>;
