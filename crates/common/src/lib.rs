//! Common types and utilities for Coffee Carousel
//!
//! This crate provides shared types used across all carousel crates.
//!
//! # Modules
//!
//! - [`error`] - Common error types
//! - [`types`] - Shared types (Table, RunMode)

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
