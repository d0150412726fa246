//! Domain types for the Pairing Engine
//!
//! Subscriber records are decoded from the subscriber table here. Decoding
//! is strict: a missing column or a cell that cannot be read aborts the
//! run before any pairing happens.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use common::{Email, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::PairingError;

// ============================================================================
// Availability
// ============================================================================

/// Set of weekdays on which a subscriber is willing to meet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    days: HashSet<Weekday>,
}

impl Availability {
    /// Create an availability set from weekdays
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    /// Parse a cell such as `"Mon, Wednesday"` or `"tue;thu"`
    ///
    /// An empty cell yields an empty set.
    pub fn parse(cell: &str) -> Result<Self, String> {
        let mut days = HashSet::new();
        for token in cell
            .split(|c: char| c == ',' || c == ';' || c == '/' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let day = token
                .parse::<Weekday>()
                .map_err(|_| format!("unknown day '{}'", token))?;
            days.insert(day);
        }
        Ok(Self { days })
    }

    /// Number of days shared with another set
    pub fn overlap(&self, other: &Availability) -> usize {
        self.days.intersection(&other.days).count()
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days in Monday-first order
    pub fn sorted(&self) -> Vec<Weekday> {
        let mut days: Vec<Weekday> = self.days.iter().copied().collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let days: Vec<String> = self.sorted().iter().map(|d| d.to_string()).collect();
        write!(f, "{}", days.join(","))
    }
}

// ============================================================================
// Run Context
// ============================================================================

/// Facts about the current run that eligibility gates may consult
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    /// ISO week number of the run date
    pub week: u32,
}

impl RunContext {
    /// Context for a specific calendar date
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            week: date.iso_week().week(),
        }
    }

    /// Context for today (UTC)
    pub fn today() -> Self {
        Self::for_date(Utc::now().date_naive())
    }
}

// ============================================================================
// Subscriber Records
// ============================================================================

/// Which optional subscriber columns a run requires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberSchema {
    /// Read the `interval` column (periodic inclusion)
    pub periodic: bool,
    /// Read the `days` and `exclusive` columns
    pub availability: bool,
}

/// One decoded row of the subscriber table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberRecord {
    pub name: String,
    pub email: Email,
    /// Include this subscriber every `interval`-th week
    pub interval: u32,
    pub availability: Availability,
    pub exclusive: bool,
}

impl SubscriberRecord {
    /// Create a record with no eligibility constraints
    pub fn new(name: impl Into<String>, email: impl Into<Email>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            interval: 1,
            availability: Availability::default(),
            exclusive: false,
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Decode every non-blank row of the subscriber table
    pub fn from_table(
        table: &Table,
        schema: SubscriberSchema,
    ) -> Result<Vec<SubscriberRecord>, PairingError> {
        let name_col = table.require_column("name")?;
        let email_col = table.require_column("email")?;
        let interval_col = match schema.periodic {
            true => Some(table.require_column("interval")?),
            false => None,
        };
        let (days_col, exclusive_col) = match schema.availability {
            true => (
                Some(table.require_column("days")?),
                Some(table.require_column("exclusive")?),
            ),
            false => (None, None),
        };

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(table.len());

        for (row, cells) in table.rows.iter().enumerate() {
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let line = row + 1;

            let email = Email::new(table.cell(row, email_col));
            if email.is_empty() {
                return Err(common::Error::malformed_cell(&table.name, line, "email", "empty").into());
            }
            if !seen.insert(email.clone()) {
                return Err(PairingError::DuplicateSubscriber(email));
            }

            let mut record = SubscriberRecord::new(table.cell(row, name_col).trim(), email);

            if let Some(col) = interval_col {
                record.interval = parse_interval(table.cell(row, col))
                    .map_err(|m| common::Error::malformed_cell(&table.name, line, "interval", m))?;
            }
            if let Some(col) = days_col {
                record.availability = Availability::parse(table.cell(row, col))
                    .map_err(|m| common::Error::malformed_cell(&table.name, line, "days", m))?;
            }
            if let Some(col) = exclusive_col {
                record.exclusive = parse_flag(table.cell(row, col))
                    .map_err(|m| common::Error::malformed_cell(&table.name, line, "exclusive", m))?;
            }

            records.push(record);
        }

        debug!(table = %table.name, count = records.len(), "Subscriber records decoded");
        Ok(records)
    }
}

fn parse_interval(cell: &str) -> Result<u32, String> {
    match cell.trim().parse::<u32>() {
        Ok(0) => Err("interval must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a positive integer", cell.trim())),
    }
}

fn parse_flag(cell: &str) -> Result<bool, String> {
    match cell.trim().to_lowercase().as_str() {
        "" | "false" | "no" | "n" | "0" => Ok(false),
        "true" | "yes" | "y" | "1" => Ok(true),
        other => Err(format!("'{}' is not a yes/no value", other)),
    }
}
