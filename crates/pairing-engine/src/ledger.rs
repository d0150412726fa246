//! History ledger
//!
//! One row per distinct ordered pair `(email1, email2)` with an integer
//! count. Rows are never symmetrized: `(a, b)` and `(b, a)` are separate
//! rows, each maintained by the participant that appears first.
//!
//! Reconciliation only ever inserts rows or increments counts.

use common::{Email, Table};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::PairingError;
use crate::participant::Participant;
use crate::result::PairingMap;

/// Column names of the history table
pub const HISTORY_COLUMNS: [&str; 3] = ["email1", "email2", "count"];

/// One past pairing in the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub first: Email,
    pub second: Email,
    pub count: u32,
}

impl LedgerRow {
    pub fn new(first: impl Into<Email>, second: impl Into<Email>, count: u32) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            count,
        }
    }

    fn key(&self) -> (Email, Email) {
        (self.first.clone(), self.second.clone())
    }
}

/// What reconciliation did to one ordered pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerAction {
    /// A new row was created with count 1
    Inserted { first: Email, second: Email },
    /// An existing row's count went from `from` to `from + 1`
    Incremented { first: Email, second: Email, from: u32 },
}

/// Summary of a reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileSummary {
    pub actions: Vec<LedgerAction>,
}

impl ReconcileSummary {
    pub fn inserted(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, LedgerAction::Inserted { .. }))
            .count()
    }

    pub fn incremented(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, LedgerAction::Incremented { .. }))
            .count()
    }
}

/// In-memory snapshot of the pairing history
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    rows: Vec<LedgerRow>,
    /// Ordered pair -> position in `rows`
    index: HashMap<(Email, Email), usize>,
}

impl HistoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from rows, rejecting duplicate ordered pairs
    pub fn from_rows(rows: Vec<LedgerRow>) -> Result<Self, PairingError> {
        let mut ledger = Self::new();
        for row in rows {
            if ledger.index.contains_key(&row.key()) {
                return Err(PairingError::DuplicateLedgerRow {
                    first: row.first,
                    second: row.second,
                });
            }
            ledger.index.insert(row.key(), ledger.rows.len());
            ledger.rows.push(row);
        }
        Ok(ledger)
    }

    /// Decode the history table
    ///
    /// A table with no header at all is treated as an empty ledger, so a
    /// freshly created sheet works on the first run.
    pub fn from_table(table: &Table) -> Result<Self, PairingError> {
        if table.header.is_empty() && table.is_empty() {
            return Ok(Self::new());
        }

        let first_col = table.require_column("email1")?;
        let second_col = table.require_column("email2")?;
        let count_col = table.require_column("count")?;

        let mut rows = Vec::with_capacity(table.len());
        for (row, cells) in table.rows.iter().enumerate() {
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let line = row + 1;

            let first = Email::new(table.cell(row, first_col));
            let second = Email::new(table.cell(row, second_col));
            if first.is_empty() {
                return Err(common::Error::malformed_cell(&table.name, line, "email1", "empty").into());
            }
            if second.is_empty() {
                return Err(common::Error::malformed_cell(&table.name, line, "email2", "empty").into());
            }

            let raw = table.cell(row, count_col).trim();
            let count = raw.parse::<u32>().map_err(|_| {
                common::Error::malformed_cell(
                    &table.name,
                    line,
                    "count",
                    format!("'{}' is not a non-negative integer", raw),
                )
            })?;

            rows.push(LedgerRow { first, second, count });
        }

        let ledger = Self::from_rows(rows)?;
        debug!(table = %table.name, rows = ledger.len(), "History ledger decoded");
        Ok(ledger)
    }

    /// Encode the ledger as a history table, rows in current order
    pub fn to_table(&self, name: impl Into<String>) -> Table {
        Table::new(
            name,
            HISTORY_COLUMNS.iter().map(|c| c.to_string()).collect(),
            self.rows
                .iter()
                .map(|r| {
                    vec![
                        r.first.to_string(),
                        r.second.to_string(),
                        r.count.to_string(),
                    ]
                })
                .collect(),
        )
    }

    /// Count recorded for the ordered pair `(first, second)`
    pub fn count(&self, first: &Email, second: &Email) -> Option<u32> {
        self.index
            .get(&(first.clone(), second.clone()))
            .map(|&i| self.rows[i].count)
    }

    /// Rows where `email` is the first member
    pub fn slice_for<'a>(&'a self, email: &'a Email) -> impl Iterator<Item = &'a LedgerRow> + 'a {
        self.rows.iter().filter(move |r| &r.first == email)
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert the ordered pair with count 1, or increment its count
    pub fn record(&mut self, first: &Email, second: &Email) -> LedgerAction {
        let key = (first.clone(), second.clone());
        match self.index.get(&key) {
            Some(&i) => {
                let row = &mut self.rows[i];
                let from = row.count;
                row.count = row.count.saturating_add(1);
                LedgerAction::Incremented {
                    first: first.clone(),
                    second: second.clone(),
                    from,
                }
            }
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(LedgerRow::new(first.clone(), second.clone(), 1));
                LedgerAction::Inserted {
                    first: first.clone(),
                    second: second.clone(),
                }
            }
        }
    }

    /// Fold a run's pairings into the ledger
    ///
    /// Every matched participant records its own ordered row
    /// `(participant, partner)`, walking the pool in the given order.
    /// Unmatched participants record nothing.
    pub fn reconcile(&mut self, pool: &[Participant], pairings: &PairingMap) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for participant in pool {
            let Some(partner) = pairings.partner_of(participant.identity()) else {
                continue;
            };
            let action = self.record(participant.identity(), partner);
            debug!(?action, "Ledger updated");
            summary.actions.push(action);
        }

        info!(
            inserted = summary.inserted(),
            incremented = summary.incremented(),
            "Ledger reconciled"
        );
        summary
    }

    /// Stable sort by first member, as written back to the store
    pub fn sort_by_first(&mut self) {
        self.rows.sort_by(|a, b| a.first.cmp(&b.first));
        self.index = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key(), i))
            .collect();
    }
}
