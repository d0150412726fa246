//! Common types used across Coffee Carousel
//!
//! This module provides the fundamental types shared by the pairing
//! engine, the table store and the orchestrator.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Subscriber identity (email address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Email(pub String);

impl Email {
    /// Create a new Email, trimming surrounding whitespace
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    /// Get the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the address is empty after trimming
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Email {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Email {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// Run Mode
// ============================================================================

/// Which set of tables a run reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Suffixed test tables, notifications are only logged
    #[default]
    Test,
    /// Production tables, notifications are sent
    Deploy,
}

impl RunMode {
    /// Build the mode from the `--deploy` flag
    pub fn from_deploy_flag(deploy: bool) -> Self {
        if deploy {
            RunMode::Deploy
        } else {
            RunMode::Test
        }
    }

    /// Resolve the concrete table name for this mode
    pub fn table_name(&self, base: &str, test_suffix: &str) -> String {
        match self {
            RunMode::Deploy => base.to_string(),
            RunMode::Test => format!("{}{}", base, test_suffix),
        }
    }

    /// Whether notifications leave the process in this mode
    pub fn sends_notifications(&self) -> bool {
        matches!(self, RunMode::Deploy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Test => "test",
            RunMode::Deploy => "deploy",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Table
// ============================================================================

/// A header row plus string data rows, as exchanged with the table store
///
/// Rows may be shorter than the header; missing trailing cells read as
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Name the table was fetched under (used in error messages)
    #[serde(skip)]
    pub name: String,
    /// Column names
    pub header: Vec<String>,
    /// Data rows
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from a header and rows
    pub fn new(name: impl Into<String>, header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            header,
            rows,
        }
    }

    /// Build a table from raw grid values where the first row is the header
    pub fn from_values(name: impl Into<String>, mut values: Vec<Vec<String>>) -> Self {
        if values.is_empty() {
            return Self::new(name, Vec::new(), Vec::new());
        }
        let header = values.remove(0);
        Self::new(name, header, values)
    }

    /// Flatten back into grid values, header first
    pub fn to_values(&self) -> Vec<Vec<String>> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.header.clone());
        values.extend(self.rows.iter().cloned());
        values
    }

    /// Find a column by name (case-insensitive, whitespace-trimmed)
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))
    }

    /// Find a column or fail with a data-shape error
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| Error::missing_column(&self.name, column))
    }

    /// Read a cell, treating cells past the end of a short row as empty
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample() -> Table {
        Table::from_values(
            "subscribers",
            vec![
                vec!["Timestamp".into(), " Name ".into(), "Email".into()],
                vec!["t1".into(), "Ada".into(), "ada@example.com".into()],
                vec!["t2".into(), "Bob".into()],
            ],
        )
    }

    #[test]
    fn test_email_trims() {
        assert_eq!(Email::new("  a@b.c ").as_str(), "a@b.c");
        assert!(Email::new("   ").is_empty());
    }

    #[test]
    fn test_run_mode_table_name() {
        assert_eq!(RunMode::Test.table_name("history", "_TEST"), "history_TEST");
        assert_eq!(RunMode::Deploy.table_name("history", "_TEST"), "history");
        assert!(RunMode::from_deploy_flag(true).sends_notifications());
        assert!(!RunMode::from_deploy_flag(false).sends_notifications());
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = sample();
        assert_eq!(table.column_index("name"), Some(1));
        assert_eq!(table.column_index("EMAIL"), Some(2));
        assert_eq!(table.column_index("interval"), None);
    }

    #[test]
    fn test_require_column_reports_table() {
        let table = sample();
        let err = table.require_column("interval").unwrap_err();
        assert_matches!(err, Error::MissingColumn { ref table, ref column }
            if table == "subscribers" && column == "interval");
        assert!(err.is_data_shape());
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let table = sample();
        assert_eq!(table.cell(1, 1), "Bob");
        assert_eq!(table.cell(1, 2), "");
        assert_eq!(table.cell(5, 0), "");
    }

    #[test]
    fn test_values_keep_header_first() {
        let table = sample();
        let values = table.to_values();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0][0], "Timestamp");
        assert!(Table::from_values("empty", Vec::new()).header.is_empty());
    }
}
