//! Transmit orchestrator (C9): a per-contact state machine that invokes
//! the five carrier hooks, enforces windows and retries, tracks history
//! at-most-once per stage, and reconciles carrier feedback.

pub mod hooks;
pub mod orchestrator;
pub mod outcome;
pub mod reconcile;

pub use hooks::TransmitHooks;
pub use orchestrator::{rescue_crash_leftovers, TransmitOrchestrator, TransmitRunReport};
pub use outcome::{HookOutcome, TransmitState};
pub use reconcile::{DocumentByFileName, ReconEntry, ReconcileReport, Reconciler};

#[cfg(test)]
mod tests {
    use super::*;
    use asap_model::*;
    use asap_ports::clock::Clock;
    use asap_ports::db::{Cursor, DbResult, Row};
    use async_trait::async_trait;
    use camino::Utf8PathBuf;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    struct FakeClock;
    impl Clock for FakeClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            Utc::now()
        }
    }

    #[derive(Default)]
    struct FakeCursor {
        rows: Mutex<Vec<Row>>,
    }

    #[async_trait]
    impl Cursor for FakeCursor {
        async fn query(&self, _table: &str, key_column: &str, key_value: &str) -> DbResult<Vec<Row>> {
            Ok(self.rows.lock().unwrap().iter().filter(|r| r.get(key_column).map(String::as_str) == Some(key_value)).cloned().collect())
        }
        async fn insert(&self, _table: &str, row: Row) -> DbResult<()> {
            self.rows.lock().unwrap().push(row);
            Ok(())
        }
    }

    struct AlwaysOkHooks {
        staged_with_103: Mutex<Vec<bool>>,
    }

    #[async_trait]
    impl TransmitHooks for AlwaysOkHooks {
        async fn stage_indexed_case(&self, _case: &Case, _xmit_dir: &camino::Utf8Path, is_first_transmit: bool, is_full_transmit: bool) -> HookOutcome {
            self.staged_with_103.lock().unwrap().push(is_first_transmit && is_full_transmit);
            HookOutcome::Ok
        }
        async fn transmit_staged_cases(&self, _xmit_dir: &camino::Utf8Path) -> HookOutcome {
            HookOutcome::Ok
        }
    }

    fn contact() -> Contact {
        Contact {
            contact_id: "C1".into(),
            client_id: "CL".into(),
            region_id: "R".into(),
            examiner: None,
            source_code: "ASAP".into(),
            doc_dir: Utf8PathBuf::from("/tmp/docs"),
            acord103_dir: Some(Utf8PathBuf::from("/tmp/103")),
            index_dir: Utf8PathBuf::from("/tmp/idx"),
            xmit_dir: Utf8PathBuf::from("/tmp/xmit"),
            index: Index { fields: vec![], delim: "\n".into(), subdelim: "=".into(), index_type: IndexType::Case },
            doc_type_client_name: BTreeMap::new(),
            doc_type_billing_code: BTreeMap::new(),
            carrier_hook_id: "demo".into(),
            on_stage_exception_policy: OnStageExceptionPolicy::Restage,
        }
    }

    fn case_with_doc(sid: &str) -> Case {
        let mut case = Case::new(CaseId::new(sid), sid, format!("T-{sid}"), "ASAP", "C1");
        case.add_document(Document { document_id: DocumentId::new("D1"), doc_type_name: "APP".into(), page_count: 1, file_name: "00000001.tif".into(), date_created: Utc::now(), f_bill: true, f_send: true });
        case
    }

    #[tokio::test]
    async fn first_and_full_transmit_bundles_103_exactly_once() {
        let cursor: Arc<dyn Cursor> = Arc::new(FakeCursor::default());
        let history = Arc::new(asap_history::DocumentHistoryLog::new(cursor, Arc::new(FakeClock), 5, 1));
        let orchestrator = TransmitOrchestrator::new(history);
        let hooks = AlwaysOkHooks { staged_with_103: Mutex::new(vec![]) };
        let contact = contact();

        let case = case_with_doc("S1");
        let report = orchestrator.stage_and_transmit_cases(&[case.clone()], &contact, &hooks).await;
        assert_eq!(report.done, vec!["S1".to_string()]);
        assert_eq!(hooks.staged_with_103.lock().unwrap().as_slice(), &[true]);

        // A second case for the same sid/contact is a partial resend: no 103.
        let report2 = orchestrator.stage_and_transmit_cases(&[case], &contact, &hooks).await;
        assert_eq!(report2.done, vec!["S1".to_string()]);
        assert_eq!(hooks.staged_with_103.lock().unwrap().as_slice(), &[true, false]);
    }

    #[tokio::test]
    async fn held_case_is_not_transmitted() {
        struct HeldHooks;
        #[async_trait]
        impl TransmitHooks for HeldHooks {
            async fn is_indexed_case_ready(&self, _case: &Case) -> bool {
                false
            }
            async fn stage_indexed_case(&self, _case: &Case, _xmit_dir: &camino::Utf8Path, _f: bool, _g: bool) -> HookOutcome {
                HookOutcome::Ok
            }
            async fn transmit_staged_cases(&self, _xmit_dir: &camino::Utf8Path) -> HookOutcome {
                HookOutcome::Ok
            }
        }

        let cursor: Arc<dyn Cursor> = Arc::new(FakeCursor::default());
        let history = Arc::new(asap_history::DocumentHistoryLog::new(cursor, Arc::new(FakeClock), 5, 1));
        let orchestrator = TransmitOrchestrator::new(history);
        let report = orchestrator.stage_and_transmit_cases(&[case_with_doc("S2")], &contact(), &HeldHooks).await;
        assert_eq!(report.held, vec!["S2".to_string()]);
        assert!(report.done.is_empty());
    }
}
