use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only audit action. Rows are never rewritten; `(sid, docId,
/// contactId, action)` may recur, and the latest timestamp wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Release,
    Invoice,
    Transmit,
    Reconcile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub sid: String,
    pub document_id: String,
    pub contact_id: String,
    pub action: HistoryAction,
    pub timestamp: DateTime<Utc>,
}
