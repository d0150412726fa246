//! Observability for Coffee Carousel
//!
//! - Structured logging via tracing
//! - Per-run Prometheus metrics
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging(LogFormat::Pretty, "info")?;
//! observability::init_metrics(9464)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, RunMetrics, RunTimer};
