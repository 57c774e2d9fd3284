//! Google Sheets v4 REST client: append a row, read all values of one worksheet.

use crate::config::SheetConfig;
use crate::sheets::{records_from_values, AppendLog, LogRecord, LogRow, SheetError, TokenSource};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsClient {
    api_base: String,
    spreadsheet_id: String,
    worksheet: String,
    tokens: TokenSource,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Cells come back as strings under the default FORMATTED_VALUE render; anything else is stringified.
fn cell_text(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetsClient {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
        tokens: TokenSource,
    ) -> Self {
        Self {
            api_base: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            tokens,
            client: reqwest::Client::new(),
        }
    }

    /// Build from config. Returns Ok(None) when the spreadsheet id or credential is missing.
    pub fn from_config(config: &SheetConfig) -> Result<Option<Self>, SheetError> {
        let (Some(id), Some(key)) = (&config.spreadsheet_id, &config.service_account) else {
            return Ok(None);
        };
        let tokens = TokenSource::new(key.clone())?;
        Ok(Some(Self::new(id.clone(), config.worksheet.clone(), tokens)))
    }

    /// Point at a different API root (tests, proxies).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/{}/values/{}{}",
            self.api_base, self.spreadsheet_id, self.worksheet, suffix
        )
    }
}

#[async_trait]
impl AppendLog for SheetsClient {
    /// POST values/{sheet}!A1:append. Rows land after the last non-empty row; cells are
    /// stored as sent (RAW), never parsed as formulas or numbers.
    async fn append(&self, row: &LogRow) -> Result<(), SheetError> {
        let token = self.tokens.access_token(&self.client).await?;
        let url = self.values_url("!A1:append");
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [row.cells()] }))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SheetError::Api(format!("append failed: {} {}", status, body)));
        }
        Ok(())
    }

    /// GET values/{sheet}. The first row is the header.
    async fn records(&self) -> Result<Vec<LogRecord>, SheetError> {
        let token = self.tokens.access_token(&self.client).await?;
        let url = self.values_url("");
        let res = self.client.get(&url).bearer_auth(token).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SheetError::Api(format!("read failed: {} {}", status, body)));
        }
        let data: ValueRange = res
            .json()
            .await
            .map_err(|e| SheetError::Malformed(e.to_string()))?;
        let values = data
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        Ok(records_from_values(values))
    }
}
