use std::sync::Arc;

use asap_acord103::Acord103Store;
use asap_history::DocumentHistoryLog;
use asap_model::HistoryAction;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("malformed reconciliation line: {0}")]
    MalformedLine(String),
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub reconciled: Vec<String>,
    pub malformed_lines: Vec<String>,
    pub retransmit_candidates: Vec<(String, String)>, // (sid, documentId)
}

/// One line of a carrier feedback feed: `<clientId>|<timestamp>|<imageFileName>`.
#[derive(Debug, Clone)]
pub struct ReconEntry {
    pub client_id: String,
    pub timestamp: String,
    pub image_file_name: String,
}

/// Parses a feed, tolerating blank lines and reporting malformed ones
/// without aborting the whole file.
pub fn parse_feed(text: &str) -> (Vec<ReconEntry>, Vec<String>) {
    let mut entries = Vec::new();
    let mut malformed = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() != 3 {
            malformed.push(line.to_string());
            continue;
        }
        entries.push(ReconEntry { client_id: parts[0].to_string(), timestamp: parts[1].to_string(), image_file_name: parts[2].to_string() });
    }
    (entries, malformed)
}

/// Resolver from an image file name (as it appears in the feed) to the
/// owning `(sid, documentId)` pair, since the feed only names files.
pub trait DocumentByFileName: Send + Sync {
    fn resolve(&self, image_file_name: &str) -> Option<(String, String)>;
}

pub struct Reconciler {
    history: Arc<DocumentHistoryLog>,
}

impl Reconciler {
    pub fn new(history: Arc<DocumentHistoryLog>) -> Self {
        Self { history }
    }

    /// Ingests a feed: for each listed image, records a `reconcile`
    /// action with the feed's timestamp. An empty feed is a no-op that
    /// still reports as processed, per the boundary-behavior contract.
    pub async fn ingest_feed(&self, text: &str, resolver: &dyn DocumentByFileName, contact_id: &str) -> ReconcileReport {
        let (entries, malformed) = parse_feed(text);
        let mut report = ReconcileReport { malformed_lines: malformed, ..Default::default() };

        for entry in &entries {
            match resolver.resolve(&entry.image_file_name) {
                Some((sid, document_id)) => {
                    let recorded = self.history.track_document(&sid, &document_id, contact_id, HistoryAction::Reconcile).await;
                    match recorded {
                        Ok(true) => report.reconciled.push(entry.image_file_name.clone()),
                        _ => warn!(file = %entry.image_file_name, "failed to record reconcile history"),
                    }
                }
                None => warn!(file = %entry.image_file_name, "reconciliation feed named an unknown image"),
            }
        }

        report
    }

    /// Documents with a `transmit` newer than the most recent `reconcile`
    /// within the lookback window: candidates for retransmit.
    pub async fn find_retransmit_candidates(&self, sid: &str, contact_id: &str, document_ids: &[String]) -> Vec<String> {
        let mut candidates = Vec::new();
        for doc_id in document_ids {
            if !self.history.is_reconciled(sid, doc_id, contact_id).await {
                candidates.push(doc_id.clone());
            }
        }
        candidates
    }

    /// Auto-restage must include the 103 re-stage first; only if that
    /// succeeds may document restage proceed.
    pub fn auto_restage(&self, acord103: &mut Acord103Store, tracking_id: &str) -> Result<(), asap_acord103::Acord103Error> {
        acord103.set_to_retrieve(tracking_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_feed_produces_no_entries_and_no_malformed_lines() {
        let (entries, malformed) = parse_feed("");
        assert!(entries.is_empty());
        assert!(malformed.is_empty());
    }

    #[test]
    fn blank_lines_are_tolerated() {
        let (entries, malformed) = parse_feed("\n\nCL1|2026-01-01T00:00:00Z|a.tif\n\n");
        assert_eq!(entries.len(), 1);
        assert!(malformed.is_empty());
    }

    #[test]
    fn malformed_line_is_reported_not_fatal() {
        let (entries, malformed) = parse_feed("not-enough-fields\nCL1|2026-01-01T00:00:00Z|a.tif");
        assert_eq!(entries.len(), 1);
        assert_eq!(malformed.len(), 1);
    }
}
