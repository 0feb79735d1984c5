//! Document-history log (C4): append-only `(sid, documentId, contactId,
//! action, actiondate)` audit trail. The `transmit` row must land at or
//! before bytes actually leave the system, so the orchestrator always
//! writes history before invoking a transport hook.

use std::collections::BTreeMap;
use std::sync::Arc;

use asap_model::{HistoryAction, HistoryItem};
use asap_ports::clock::Clock;
use asap_ports::db::{Cursor, Row};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

pub const TABLE_NAME: &str = "asap_document_history";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history insert failed after {attempts} attempts: {reason}")]
    InsertFailed { attempts: u32, reason: String },
}

pub type HistoryResult<T> = Result<T, HistoryError>;

fn action_str(action: HistoryAction) -> &'static str {
    match action {
        HistoryAction::Release => "release",
        HistoryAction::Invoice => "invoice",
        HistoryAction::Transmit => "transmit",
        HistoryAction::Reconcile => "reconcile",
    }
}

fn parse_action(s: &str) -> Option<HistoryAction> {
    match s {
        "release" => Some(HistoryAction::Release),
        "invoice" => Some(HistoryAction::Invoice),
        "transmit" => Some(HistoryAction::Transmit),
        "reconcile" => Some(HistoryAction::Reconcile),
        _ => None,
    }
}

fn row_to_item(row: &Row) -> Option<HistoryItem> {
    Some(HistoryItem {
        sid: row.get("sid")?.clone(),
        document_id: row.get("document_id")?.clone(),
        contact_id: row.get("contact_id")?.clone(),
        action: parse_action(row.get("action")?)?,
        timestamp: row.get("actiondate")?.parse::<DateTime<Utc>>().ok()?,
    })
}

fn item_to_row(item: &HistoryItem) -> Row {
    let mut row: Row = BTreeMap::new();
    row.insert("sid".to_string(), item.sid.clone());
    row.insert("document_id".to_string(), item.document_id.clone());
    row.insert("contact_id".to_string(), item.contact_id.clone());
    row.insert("action".to_string(), action_str(item.action).to_string());
    row.insert("actiondate".to_string(), item.timestamp.to_rfc3339());
    row
}

pub struct DocumentHistoryLog {
    cursor: Arc<dyn Cursor>,
    clock: Arc<dyn Clock>,
    retry_attempts: u32,
    retry_sleep: std::time::Duration,
}

impl DocumentHistoryLog {
    pub fn new(cursor: Arc<dyn Cursor>, clock: Arc<dyn Clock>, retry_attempts: u32, retry_sleep_ms: u64) -> Self {
        Self { cursor, clock, retry_attempts, retry_sleep: std::time::Duration::from_millis(retry_sleep_ms) }
    }

    /// Retries the insert up to `retry_attempts` times with a short sleep
    /// between attempts. The timestamp is stamped from the injected clock
    /// at call time, not retried per attempt, so retries don't smear the
    /// ordering guarantee.
    pub async fn track_document(&self, sid: &str, document_id: &str, contact_id: &str, action: HistoryAction) -> HistoryResult<bool> {
        let item = HistoryItem { sid: sid.to_string(), document_id: document_id.to_string(), contact_id: contact_id.to_string(), action, timestamp: self.clock.now() };
        let row = item_to_row(&item);

        let mut last_err = String::new();
        for attempt in 1..=self.retry_attempts.max(1) {
            match self.cursor.insert(TABLE_NAME, row.clone()).await {
                Ok(()) => return Ok(true),
                Err(err) => {
                    last_err = err.to_string();
                    warn!(attempt, error = %err, "history insert failed, retrying");
                    if attempt < self.retry_attempts {
                        tokio::time::sleep(self.retry_sleep).await;
                    }
                }
            }
        }
        Err(HistoryError::InsertFailed { attempts: self.retry_attempts, reason: last_err })
    }

    /// `MAX(actiondate)` for this `(sid, documentId, contactId, action)`.
    pub async fn get_date_tracked(&self, sid: &str, document_id: &str, contact_id: &str, action: HistoryAction) -> Option<DateTime<Utc>> {
        let rows = self.cursor.query(TABLE_NAME, "sid", sid).await.ok()?;
        rows.iter()
            .filter_map(row_to_item)
            .filter(|item| item.document_id == document_id && item.contact_id == contact_id && item.action == action)
            .map(|item| item.timestamp)
            .max()
    }

    /// `(docId, maxTimestamp)` pairs for every document attached to this
    /// case that has at least one row with `action`.
    pub async fn get_tracked_docids_for_case(&self, sid: &str, contact_id: &str, action: HistoryAction) -> Vec<(String, DateTime<Utc>)> {
        let rows = match self.cursor.query(TABLE_NAME, "sid", sid).await {
            Ok(rows) => rows,
            Err(_) => return Vec::new(),
        };
        let mut by_doc: BTreeMap<String, DateTime<Utc>> = BTreeMap::new();
        for item in rows.iter().filter_map(row_to_item).filter(|item| item.contact_id == contact_id && item.action == action) {
            by_doc
                .entry(item.document_id.clone())
                .and_modify(|ts| *ts = (*ts).max(item.timestamp))
                .or_insert(item.timestamp);
        }
        by_doc.into_iter().collect()
    }

    /// `reconcile.max >= transmit.max` for this document.
    pub async fn is_reconciled(&self, sid: &str, document_id: &str, contact_id: &str) -> bool {
        let transmitted = self.get_date_tracked(sid, document_id, contact_id, HistoryAction::Transmit).await;
        let reconciled = self.get_date_tracked(sid, document_id, contact_id, HistoryAction::Reconcile).await;
        match (transmitted, reconciled) {
            (Some(t), Some(r)) => r >= t,
            (None, _) => false,
            (Some(_), None) => false,
        }
    }

    /// No prior `transmit` row for this `(sid, contact)` at all.
    pub async fn is_first_transmit(&self, sid: &str, contact_id: &str) -> bool {
        self.get_tracked_docids_for_case(sid, contact_id, HistoryAction::Transmit).await.is_empty()
    }
}
