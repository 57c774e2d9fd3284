//! In-process log used when no spreadsheet is configured, and by tests.

use crate::sheets::{records_from_values, AppendLog, LogRecord, LogRow, SheetError, LOG_HEADER};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryLog {
    rows: RwLock<VecDeque<LogRow>>,
    /// None keeps every row.
    max_rows: Option<usize>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the newest `max_rows` rows.
    pub fn bounded(max_rows: usize) -> Self {
        Self {
            rows: RwLock::default(),
            max_rows: Some(max_rows.max(1)),
        }
    }

    /// Snapshot of retained rows, oldest first.
    pub async fn rows(&self) -> Vec<LogRow> {
        self.rows.read().await.iter().cloned().collect()
    }
}

#[async_trait]
impl AppendLog for MemoryLog {
    async fn append(&self, row: &LogRow) -> Result<(), SheetError> {
        let mut g = self.rows.write().await;
        if let Some(max) = self.max_rows {
            while g.len() >= max {
                g.pop_front();
            }
        }
        g.push_back(row.clone());
        Ok(())
    }

    async fn records(&self) -> Result<Vec<LogRecord>, SheetError> {
        let g = self.rows.read().await;
        let mut values: Vec<Vec<String>> = Vec::with_capacity(g.len() + 1);
        values.push(LOG_HEADER.iter().map(|h| h.to_string()).collect());
        values.extend(g.iter().map(LogRow::cells));
        Ok(records_from_values(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::MessageKind;

    #[tokio::test]
    async fn append_then_records_round_trips_type_column() {
        let log = MemoryLog::new();
        log.append(&LogRow::now("a", MessageKind::Text, "hi", "r1"))
            .await
            .unwrap();
        log.append(&LogRow::now("b", MessageKind::Media, "https://x/img.jpg", "r2"))
            .await
            .unwrap();
        let records = log.records().await.unwrap();
        let kinds: Vec<_> = records.iter().map(|r| r.get("type").unwrap()).collect();
        assert_eq!(kinds, vec!["text", "media"]);
        assert_eq!(log.rows().await.len(), 2);
    }

    #[tokio::test]
    async fn bounded_log_drops_oldest_rows() {
        let log = MemoryLog::bounded(2);
        for content in ["one", "two", "three"] {
            log.append(&LogRow::now("a", MessageKind::Text, content, "r"))
                .await
                .unwrap();
        }
        let contents: Vec<_> = log.rows().await.into_iter().map(|r| r.content).collect();
        assert_eq!(contents, vec!["two", "three"]);
        assert_eq!(log.records().await.unwrap().len(), 2);
    }
}
