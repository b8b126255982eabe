//! Google Sheets v4 `values` adapter.
//!
//! Ranges are A1 notation against one named tab:
//! - read: `'<tab>'!<first>:<status>` (whole columns, header included)
//! - write: `'<tab>'!<status><row_index + 2>` (1-based rows, one header row)
//!
//! Auth is a bearer token obtained outside this crate.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use roster_core::{SheetSettings, Status};
use roster_sync::{SheetGateway, SheetReadError, TransientWriteError};

use crate::error::RemoteError;
use crate::{agent, encode_segment};

/// Sheet rows are 1-based and the first one is the header.
const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Absent when the range is empty.
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct SheetsClient {
    agent: ureq::Agent,
    api_base: String,
    spreadsheet_id: String,
    sheet_name: String,
    first_column: String,
    status_column: String,
    token: String,
}

impl SheetsClient {
    pub fn new(settings: &SheetSettings, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: agent(timeout),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: settings.spreadsheet_id.clone(),
            sheet_name: settings.sheet_name.clone(),
            first_column: settings.first_column.to_ascii_uppercase(),
            status_column: settings.status_column.to_ascii_uppercase(),
            token: token.into(),
        }
    }

    /// `'<tab>'!A:E`
    pub fn read_range(&self) -> String {
        format!(
            "{}!{}:{}",
            quote_sheet_name(&self.sheet_name),
            self.first_column,
            self.status_column
        )
    }

    /// `'<tab>'!E<n>` for data row `row_index`.
    pub fn status_range(&self, row_index: usize) -> String {
        format!(
            "{}!{}{}",
            quote_sheet_name(&self.sheet_name),
            self.status_column,
            row_index + FIRST_DATA_ROW
        )
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.api_base,
            encode_segment(&self.spreadsheet_id),
            encode_segment(range)
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn fetch_rows(&self) -> Result<Vec<Vec<String>>, RemoteError> {
        let url = self.values_url(&self.read_range());
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &self.bearer())
            .call()?;
        let body: ValueRange = response
            .into_json()
            .map_err(|source| RemoteError::Decode { url, source })?;
        Ok(body.values)
    }

    fn put_status(&self, row_index: usize, status: Status) -> Result<(), RemoteError> {
        let range = self.status_range(row_index);
        let url = self.values_url(&range);
        self.agent
            .put(&url)
            .query("valueInputOption", "USER_ENTERED")
            .set("Authorization", &self.bearer())
            .send_json(json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [[status.as_cell()]],
            }))?;
        Ok(())
    }
}

impl SheetGateway for SheetsClient {
    fn read_all_rows(&mut self) -> Result<Vec<Vec<String>>, SheetReadError> {
        let rows = self
            .fetch_rows()
            .map_err(|e| SheetReadError::new(e.to_string()))?;
        tracing::info!("read {} rows from '{}'", rows.len(), self.sheet_name);
        Ok(rows)
    }

    fn write_status(&mut self, row_index: usize, status: Status) -> Result<(), TransientWriteError> {
        self.put_status(row_index, status)
            .map_err(|e| TransientWriteError::new(e.to_string()))?;
        tracing::debug!("{} <- {}", self.status_range(row_index), status.as_cell());
        Ok(())
    }
}

/// Quote a tab name for A1 notation; embedded `'` doubles.
fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}
