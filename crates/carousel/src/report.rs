//! Run report

use common::{Email, RunMode};
use notify::DispatchReport;
use pairing_engine::ReconcileSummary;
use uuid::Uuid;

/// What one run did
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: RunMode,
    /// ISO week the run was evaluated in
    pub week: u32,
    /// Subscribers decoded from the table
    pub subscribers: usize,
    /// Participants that passed the periodic gate
    pub eligible: usize,
    /// Pairs as `(chooser, chosen)` in creation order
    pub pairs: Vec<(Email, Email)>,
    pub unmatched: Vec<Email>,
    pub ledger: ReconcileSummary,
    pub notifications: DispatchReport,
}

impl RunReport {
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        format!(
            "run {} ({}): {} subscribers, {} eligible, {} pairs, {} unmatched, {}/{} notified",
            self.run_id,
            self.mode,
            self.subscribers,
            self.eligible,
            self.pairs.len(),
            self.unmatched.len(),
            self.notifications.sent,
            self.notifications.total
        )
    }
}
