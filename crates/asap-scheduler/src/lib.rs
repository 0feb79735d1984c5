//! Main scheduler (C10): the per-run driver. Exports released cases, then
//! spawns one worker per contact bounded by a concurrency cap, joins
//! them, and composes an error summary. No exception escapes a worker:
//! failures raise the run-level error flag instead.

pub mod cancellation;
pub mod worker;

pub use cancellation::CancellationToken;
pub use worker::{ContactWorker, WorkerOutcome};

use std::sync::Arc;

use asap_config::ConfigStore;
use tokio::sync::Semaphore;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct RunReport {
    pub per_contact: Vec<(String, WorkerOutcome)>,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        self.per_contact.iter().any(|(_, o)| o.has_errors())
    }

    pub fn total_transmitted(&self) -> usize {
        self.per_contact.iter().map(|(_, o)| o.transmitted).sum()
    }
}

pub struct MainScheduler {
    config: Arc<ConfigStore>,
    worker: Arc<dyn ContactWorker>,
    concurrency_cap: usize,
}

impl MainScheduler {
    pub fn new(config: Arc<ConfigStore>, worker: Arc<dyn ContactWorker>) -> Self {
        let concurrency_cap = config.settings().concurrency_cap.max(1);
        Self { config, worker, concurrency_cap }
    }

    /// Spawns one task per enabled contact, bounded by `concurrency_cap`
    /// (the original runs with a cap of one; the contract permits up to
    /// N). `cancel` is polled between contacts, not mid-worker.
    pub async fn run(&self, cancel: CancellationToken) -> RunReport {
        let semaphore = Arc::new(Semaphore::new(self.concurrency_cap));
        let mut handles = Vec::new();

        for contact in self.config.get_contacts() {
            if cancel.is_cancelled() {
                info!("cancellation observed; not starting new contact workers");
                break;
            }
            let contact = contact.clone();
            let worker = self.worker.clone();
            let permit = semaphore.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.expect("semaphore never closed");
                let outcome = worker.run_once(&contact).await;
                (contact.contact_id, outcome)
            }));
        }

        let mut report = RunReport::default();
        for handle in handles {
            match handle.await {
                Ok((contact_id, outcome)) => report.per_contact.push((contact_id, outcome)),
                Err(join_err) => warn!(error = %join_err, "contact worker task panicked; run-level error flag raised"),
            }
        }

        info!(transmitted = report.total_transmitted(), errors = report.has_errors(), "run complete");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingWorker(Arc<AtomicUsize>);

    #[async_trait]
    impl ContactWorker for CountingWorker {
        async fn run_once(&self, _contact: &asap_model::Contact) -> WorkerOutcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            WorkerOutcome { transmitted: 1, ..Default::default() }
        }
    }

    fn config_with_contacts(n: usize) -> ConfigStore {
        use asap_config::model::{GlobalSettings, RawConfig};
        use asap_model::{Contact, Index, IndexType, OnStageExceptionPolicy};
        use camino::Utf8PathBuf;
        use std::collections::BTreeMap;

        let contacts = (0..n)
            .map(|i| Contact {
                contact_id: format!("C{i}"),
                client_id: "CL".into(),
                region_id: "R".into(),
                examiner: None,
                source_code: "ASAP".into(),
                doc_dir: Utf8PathBuf::from("/tmp/docs"),
                acord103_dir: None,
                index_dir: Utf8PathBuf::from("/tmp/idx"),
                xmit_dir: Utf8PathBuf::from("/tmp/xmit"),
                index: Index { fields: vec![], delim: "\n".into(), subdelim: "=".into(), index_type: IndexType::Case },
                doc_type_client_name: BTreeMap::new(),
                doc_type_billing_code: BTreeMap::new(),
                carrier_hook_id: "demo".into(),
                on_stage_exception_policy: OnStageExceptionPolicy::Restage,
            })
            .collect();

        ConfigStore::from_raw(RawConfig {
            settings: GlobalSettings {
                report_id: "R".into(),
                build_subdir: "build".into(),
                error_subdir: "error".into(),
                processed_subdir: "processed".into(),
                delta_qc_sid_field: "sid".into(),
                no_bill_codes: vec![],
                no_bill_no_send_codes: vec![],
                concurrency_cap: 2,
                history_retry_attempts: 5,
                history_retry_sleep_ms: 100,
            },
            databases: vec![],
            contacts,
        })
    }

    #[tokio::test]
    async fn runs_one_worker_per_contact() {
        let config = Arc::new(config_with_contacts(3));
        let calls = Arc::new(AtomicUsize::new(0));
        let worker = Arc::new(CountingWorker(calls.clone()));
        let scheduler = MainScheduler::new(config, worker);

        let report = scheduler.run(CancellationToken::new()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.total_transmitted(), 3);
    }

    #[tokio::test]
    async fn cancellation_before_run_starts_no_workers() {
        let config = Arc::new(config_with_contacts(2));
        let calls = Arc::new(AtomicUsize::new(0));
        let worker = Arc::new(CountingWorker(calls.clone()));
        let scheduler = MainScheduler::new(config, worker);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = scheduler.run(cancel).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(report.per_contact.is_empty());
    }
}
