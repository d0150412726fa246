//! Prometheus metrics for carousel runs
//!
//! Metrics are recorded through the `metrics` facade. Without an installed
//! exporter every call is a no-op, so the orchestrator records
//! unconditionally and the binary decides whether to export.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on `0.0.0.0:{port}/metrics`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new().with_http_listener(addr).install()?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Metrics for one carousel run, labelled by run mode
///
/// * `carousel_runs_total` - runs started
/// * `carousel_run_failures_total` - runs that ended in an error
/// * `carousel_subscribers` - subscribers read this run
/// * `carousel_pool_size` - participants eligible this run
/// * `carousel_pairs` / `carousel_unmatched` - pairing outcome
/// * `carousel_notifications_sent_total` / `carousel_notifications_failed_total`
/// * `carousel_run_duration_seconds`
#[derive(Clone)]
pub struct RunMetrics {
    runs: Counter,
    failures: Counter,
    subscribers: Gauge,
    pool_size: Gauge,
    pairs: Gauge,
    unmatched: Gauge,
    notifications_sent: Counter,
    notifications_failed: Counter,
    duration: Histogram,
    mode: String,
}

impl RunMetrics {
    pub fn new(mode: &str) -> Self {
        let mode = mode.to_string();

        Self {
            runs: counter!("carousel_runs_total", "mode" => mode.clone()),
            failures: counter!("carousel_run_failures_total", "mode" => mode.clone()),
            subscribers: gauge!("carousel_subscribers", "mode" => mode.clone()),
            pool_size: gauge!("carousel_pool_size", "mode" => mode.clone()),
            pairs: gauge!("carousel_pairs", "mode" => mode.clone()),
            unmatched: gauge!("carousel_unmatched", "mode" => mode.clone()),
            notifications_sent: counter!("carousel_notifications_sent_total", "mode" => mode.clone()),
            notifications_failed: counter!("carousel_notifications_failed_total", "mode" => mode.clone()),
            duration: histogram!("carousel_run_duration_seconds", "mode" => mode.clone()),
            mode,
        }
    }

    /// Record the start of a run; the returned guard records its duration
    pub fn run_started(&self) -> RunTimer<'_> {
        self.runs.increment(1);
        RunTimer {
            metrics: self,
            start: Instant::now(),
            succeeded: false,
        }
    }

    pub fn record_pool(&self, subscribers: usize, eligible: usize) {
        self.subscribers.set(subscribers as f64);
        self.pool_size.set(eligible as f64);
    }

    pub fn record_outcome(&self, pairs: usize, unmatched: usize) {
        self.pairs.set(pairs as f64);
        self.unmatched.set(unmatched as f64);
    }

    pub fn record_notifications(&self, sent: usize, failed: usize) {
        self.notifications_sent.increment(sent as u64);
        self.notifications_failed.increment(failed as u64);
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }
}

/// Records the run duration when dropped, and a failure unless
/// [`RunTimer::succeeded`] was called
pub struct RunTimer<'a> {
    metrics: &'a RunMetrics,
    start: Instant,
    succeeded: bool,
}

impl RunTimer<'_> {
    /// Mark the run as successful; without this the drop counts a failure
    pub fn succeeded(mut self) {
        self.succeeded = true;
    }
}

impl Drop for RunTimer<'_> {
    fn drop(&mut self) {
        self.metrics.duration.record(self.start.elapsed().as_secs_f64());
        if !self.succeeded {
            self.metrics.failures.increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_harmless() {
        let metrics = RunMetrics::new("test");
        assert_eq!(metrics.mode(), "test");

        let timer = metrics.run_started();
        metrics.record_pool(7, 6);
        metrics.record_outcome(3, 0);
        metrics.record_notifications(6, 0);
        timer.succeeded();
    }
}
