/// Google Sheets sink (Sheets API v4).
///
/// `initialize` clears the tab, writes the header, then bolds and freezes
/// row 1 in one `batchUpdate`. Each `append` is one `values:append` call
/// with `valueInputOption=RAW`, so titles beginning with `=` stay text.
use crate::config::{ReportConfig, ENV_ACCESS_TOKEN};
use crate::error::{AuditError, Result};
use crate::model::format::format_timestamp;
use crate::model::{Cell, ReportRow};
use crate::remote::http::ApiClient;
use crate::sink::ReportSink;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

pub struct SheetsSink {
    api: ApiClient,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
}

impl SheetsSink {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Option<Duration>,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(token, timeout)?,
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        })
    }

    pub fn from_config(config: &ReportConfig, spreadsheet_id: &str, sheet_name: &str) -> Result<Self> {
        let token = config.access_token.clone().ok_or_else(|| {
            AuditError::config(format!("no access token; set {ENV_ACCESS_TOKEN}"))
        })?;
        Self::new(
            config.sheets_api_base.clone(),
            token,
            config.request_timeout_secs.map(Duration::from_secs),
            spreadsheet_id,
            sheet_name,
        )
    }

    /// `values/{range}:{action}` endpoint for the whole tab.
    fn values_endpoint(&self, action: &str) -> Result<reqwest::Url> {
        let range = format!("{}:{action}", a1_sheet_range(&self.sheet_name));
        ApiClient::endpoint(
            &self.base_url,
            &["spreadsheets", &self.spreadsheet_id, "values", &range],
        )
    }

    fn append_values(&self, values: Vec<Value>) -> Result<()> {
        let url = self.values_endpoint("append")?;
        let query = [
            ("valueInputOption", "RAW".to_string()),
            ("insertDataOption", "INSERT_ROWS".to_string()),
        ];
        let _: Value = self
            .api
            .post_json(url, &query, &json!({ "values": [values] }))?;
        Ok(())
    }

    fn sheet_id(&self) -> Result<i64> {
        let url = ApiClient::endpoint(&self.base_url, &["spreadsheets", &self.spreadsheet_id])?;
        let meta: SpreadsheetMeta = self.api.get_json(
            url,
            &[("fields", "sheets.properties(sheetId,title)".to_string())],
        )?;
        meta.sheets
            .into_iter()
            .find(|s| s.properties.title == self.sheet_name)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| {
                AuditError::config(format!(
                    "spreadsheet {} has no tab named '{}'",
                    self.spreadsheet_id, self.sheet_name
                ))
            })
    }

    fn style_header(&self) -> Result<()> {
        let sheet_id = self.sheet_id()?;
        let url = ApiClient::endpoint(
            &self.base_url,
            &["spreadsheets", &format!("{}:batchUpdate", self.spreadsheet_id)],
        )?;
        let _: Value = self.api.post_json(url, &[], &header_style_requests(sheet_id))?;
        Ok(())
    }
}

impl ReportSink for SheetsSink {
    fn initialize(&mut self, headers: &[&str]) -> Result<()> {
        let url = self.values_endpoint("clear")?;
        let _: Value = self.api.post_json(url, &[], &json!({}))?;
        debug!("Cleared {}", self.describe());

        self.append_values(headers.iter().map(|h| json!(h)).collect())?;
        self.style_header()?;
        info!("Header written to {}", self.describe());
        Ok(())
    }

    fn append(&mut self, row: &ReportRow) -> Result<()> {
        self.append_values(row.cells().iter().map(cell_value).collect())
    }

    fn describe(&self) -> String {
        format!("spreadsheet {} tab '{}'", self.spreadsheet_id, self.sheet_name)
    }
}

/// A1 range covering a whole tab; names are always quoted, `'` doubled.
fn a1_sheet_range(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

fn cell_value(cell: &Cell) -> Value {
    match cell {
        Cell::Text(s) => json!(s),
        Cell::Timestamp(t) => json!(format_timestamp(*t)),
        Cell::Flag(b) => json!(b),
        Cell::Count(n) => json!(n),
    }
}

/// Bold row 1 and freeze it.
fn header_style_requests(sheet_id: i64) -> Value {
    json!({
        "requests": [
            {
                "repeatCell": {
                    "range": { "sheetId": sheet_id, "startRowIndex": 0, "endRowIndex": 1 },
                    "cell": { "userEnteredFormat": { "textFormat": { "bold": true } } },
                    "fields": "userEnteredFormat.textFormat.bold"
                }
            },
            {
                "updateSheetProperties": {
                    "properties": { "sheetId": sheet_id, "gridProperties": { "frozenRowCount": 1 } },
                    "fields": "gridProperties.frozenRowCount"
                }
            }
        ]
    })
}
