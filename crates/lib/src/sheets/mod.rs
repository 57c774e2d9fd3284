//! Append-only interaction log backed by a spreadsheet.
//!
//! Every inbound message becomes one `LogRow` (timestamp, sender, kind, content, reply).
//! `AppendLog` is the seam the coach writes through; `SheetsClient` talks to Google Sheets,
//! `MemoryLog` keeps rows in-process for tests and unconfigured runs.

mod auth;
mod google;
mod memory;

pub use auth::{parse_service_account_json, ServiceAccountKey, TokenSource};
pub use google::SheetsClient;
pub use memory::MemoryLog;

use crate::inbound::MessageKind;
use async_trait::async_trait;
use std::collections::HashMap;

/// Header row of the log sheet. `type` is the column the status summary reads.
pub const LOG_HEADER: [&str; 5] = ["timestamp", "from", "type", "content", "reply"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("sheet request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("sheet auth failed: {0}")]
    Auth(String),
    #[error("sheet api error: {0}")]
    Api(String),
    #[error("sheet response malformed: {0}")]
    Malformed(String),
}

/// One logged interaction. Cells are written in `LOG_HEADER` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub timestamp: String,
    pub sender: String,
    pub kind: MessageKind,
    pub content: String,
    pub reply: String,
}

impl LogRow {
    /// Row stamped with the current local time.
    pub fn now(
        sender: impl Into<String>,
        kind: MessageKind,
        content: impl Into<String>,
        reply: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            sender: sender.into(),
            kind,
            content: content.into(),
            reply: reply.into(),
        }
    }

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.sender.clone(),
            self.kind.as_str().to_string(),
            self.content.clone(),
            self.reply.clone(),
        ]
    }
}

/// A data row keyed by the sheet's header row. Missing cells read as "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRecord {
    fields: HashMap<String, String>,
}

impl LogRecord {
    pub fn from_cells(header: &[String], cells: &[String]) -> Self {
        let fields = header
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), cells.get(i).cloned().unwrap_or_default()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// Turn raw sheet values (first row = header) into records. Empty sheet => no records.
pub fn records_from_values(values: Vec<Vec<String>>) -> Vec<LogRecord> {
    let mut rows = values.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    rows.map(|cells| LogRecord::from_cells(&header, &cells))
        .collect()
}

/// Durable append-only log of interactions.
#[async_trait]
pub trait AppendLog: Send + Sync {
    /// Append one row at the end of the log.
    async fn append(&self, row: &LogRow) -> Result<(), SheetError>;

    /// All data rows, in append order.
    async fn records(&self) -> Result<Vec<LogRecord>, SheetError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn row_cells_follow_header_order() {
        let row = LogRow {
            timestamp: "2024-05-01 05:00:00".to_string(),
            sender: "whatsapp:+911234".to_string(),
            kind: MessageKind::Text,
            content: "I want to skip today".to_string(),
            reply: "Not acceptable".to_string(),
        };
        assert_eq!(
            row.cells(),
            strings(&[
                "2024-05-01 05:00:00",
                "whatsapp:+911234",
                "text",
                "I want to skip today",
                "Not acceptable"
            ])
        );
    }

    #[test]
    fn now_uses_sheet_timestamp_format() {
        let row = LogRow::now("s", MessageKind::Media, "u", "r");
        assert!(chrono::NaiveDateTime::parse_from_str(&row.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn records_are_keyed_by_header_and_padded() {
        let values = vec![
            strings(&LOG_HEADER),
            strings(&["t1", "a", "text", "hi", "yo"]),
            strings(&["t2", "b", "media"]),
        ];
        let records = records_from_values(values);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("type"), Some("text"));
        assert_eq!(records[1].get("type"), Some("media"));
        assert_eq!(records[1].get("reply"), Some(""));
        assert_eq!(records[1].get("nope"), None);
    }

    #[test]
    fn empty_or_header_only_sheet_has_no_records() {
        assert!(records_from_values(Vec::new()).is_empty());
        assert!(records_from_values(vec![strings(&LOG_HEADER)]).is_empty());
    }
}
