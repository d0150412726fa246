//! Pairing Engine for Coffee Carousel
//!
//! This crate implements the decision logic of the carousel: turning a
//! pool of subscribers and their pairing history into one-on-one pairs,
//! and folding those pairs back into the history ledger.
//!
//! # Modules
//!
//! - [`domain`] - Subscriber records, availability and run context
//! - [`participant`] - Per-run matching state of one subscriber
//! - [`engine`] - Greedy least-history pairing
//! - [`ledger`] - History ledger and reconciliation
//! - [`result`] - Pairing map and run outcome

pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod participant;
pub mod result;

pub use domain::{Availability, RunContext, SubscriberRecord, SubscriberSchema};
pub use engine::{EngineConfig, PairingEngine, TieBreak};
pub use error::PairingError;
pub use ledger::{HistoryLedger, LedgerAction, LedgerRow, ReconcileSummary};
pub use participant::Participant;
pub use result::{PairingMap, PairingOutcome};

/// Result type for pairing operations
pub type Result<T> = std::result::Result<T, PairingError>;
