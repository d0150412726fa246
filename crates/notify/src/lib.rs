//! Notifications for Coffee Carousel
//!
//! After the history ledger is committed every participant of the run gets
//! one message: either who they were matched with, or that nobody was left
//! for them this time.
//!
//! - [`Notifier`] - delivery seam
//! - [`HttpMailer`] - transactional mail relay over HTTP
//! - [`LogNotifier`] - test-mode sink that only logs
//! - [`dispatch`] - bounded-concurrency fan-out with per-send timeout

mod dispatch;
pub mod error;
mod mailer;
mod message;

pub use dispatch::{dispatch, DeliveryFailure, DispatchReport};
pub use error::NotifyError;
pub use mailer::{HttpMailer, LogNotifier, Notifier};
pub use message::{Message, MessageKind, Templates};

/// Result type for notification operations
pub type Result<T> = std::result::Result<T, NotifyError>;
