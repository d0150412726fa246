//! Google Sheets table store
//!
//! Each table is one sheet (tab) of a spreadsheet, addressed through the
//! values API. A table is read with a single `GET` of the whole sheet and
//! written by `PUT`ting the new grid over it. Rows below the new grid are
//! cleared only after the write succeeded, so a failed write leaves the
//! previous content in place.

use async_trait::async_trait;
use common::Table;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::StorageError;
use crate::traits::{StoreResult, TableStore};

/// Body of a values `GET` response; `values` is absent for an empty sheet
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Body of a values `PUT` request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<String>>,
}

/// Table store backed by a Google spreadsheet
pub struct SheetsTableStore {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    access_token: String,
}

impl SheetsTableStore {
    /// Create a new store
    pub fn new(
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;
        Self::with_client(client, base_url, spreadsheet_id, access_token)
    }

    /// Create a store around an existing HTTP client
    pub fn with_client(
        client: Client,
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> StoreResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StorageError::Config(format!("invalid api_base_url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Config(format!(
                "api_base_url '{}' cannot be used as a base",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
        })
    }

    /// Create a store from the `sheet` config section
    pub fn from_config(sheet: &config::SheetConfig) -> StoreResult<Self> {
        Self::new(
            &sheet.api_base_url,
            sheet.spreadsheet_id.clone(),
            sheet.access_token.clone(),
            Duration::from_secs(sheet.request_timeout_seconds),
        )
    }

    /// `{base}/spreadsheets/{id}/values/{range}{suffix}` with path segments escaped
    fn values_url(&self, range: &str, suffix: &str) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::Config("api_base_url cannot be a base".to_string()))?;
            segments
                .pop_if_empty()
                .push("spreadsheets")
                .push(&self.spreadsheet_id)
                .push("values")
                .push(&format!("{}{}", range, suffix));
        }
        Ok(url)
    }

    async fn check(table: &str, response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        // The API reports a missing tab as an unparsable range
        if status.as_u16() == 404 || body.contains("Unable to parse range") {
            return Err(StorageError::NotFound(table.to_string()));
        }
        Err(StorageError::Status {
            table: table.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Render a cell as the string a user sees in the sheet
fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_values(table: &str, body: &str) -> StoreResult<Table> {
    let range: ValueRange =
        serde_json::from_str(body).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let values = range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect();
    Ok(Table::from_values(table, values))
}

#[async_trait]
impl TableStore for SheetsTableStore {
    #[instrument(skip(self))]
    async fn fetch_table(&self, name: &str) -> StoreResult<Table> {
        let url = self.values_url(name, "")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let body = Self::check(name, response).await?.text().await?;

        let table = parse_values(name, &body)?;
        debug!(rows = table.len(), "Fetched sheet");
        Ok(table)
    }

    #[instrument(skip(self, table), fields(rows = table.len()))]
    async fn replace_table(&self, name: &str, table: &Table) -> StoreResult<()> {
        let values = table.to_values();
        let written_rows = values.len();

        let mut update_url = self.values_url(name, "")?;
        update_url
            .query_pairs_mut()
            .append_pair("valueInputOption", "RAW");
        let response = self
            .client
            .put(update_url)
            .bearer_auth(&self.access_token)
            .json(&ValueRangeUpdate {
                range: name,
                major_dimension: "ROWS",
                values,
            })
            .send()
            .await?;
        Self::check(name, response).await?;

        // The new grid is committed; leftovers below it are cosmetic
        let tail = tail_range(name, written_rows);
        if let Err(e) = self.clear_range(name, &tail).await {
            warn!(range = %tail, error = %e, "Could not clear rows below the new table");
        }

        debug!("Replaced sheet");
        Ok(())
    }
}

impl SheetsTableStore {
    async fn clear_range(&self, table: &str, range: &str) -> StoreResult<()> {
        let url = self.values_url(range, ":clear")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::check(table, response).await?;
        Ok(())
    }
}

/// A1 range covering every row after the first `written_rows` rows
fn tail_range(sheet: &str, written_rows: usize) -> String {
    format!("'{}'!A{}:ZZZ", sheet.replace('\'', "''"), written_rows + 1)
}
