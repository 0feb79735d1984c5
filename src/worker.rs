//! The composition seam: one [`PipelineContactWorker`] per run, wiring
//! the viable-case resolver, index builder, and transmit orchestrator
//! together against a single contact, the way the scheduler's `run_once`
//! contract expects.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use camino::Utf8Path;
use tracing::{info, warn};

use asap_acord103::Acord103Store;
use asap_history::DocumentHistoryLog;
use asap_index::IndexBuilder;
use asap_model::{Case, CaseId, Contact, HistoryAction};
use asap_ports::db::Cursor;
use asap_scheduler::{ContactWorker, WorkerOutcome};
use asap_transmit::TransmitOrchestrator;
use asap_viable::{analyze_case, Acord103Repo, AnalyzeOptions, GateReason, ViableCaseResolver};

use crate::hooks::HookRegistry;
use crate::repos::DocumentHydrator;

/// Finds candidate sids for a contact by scanning the case-QC logical db
/// for `Released` rows. This is the composition layer's own concern (the
/// "query released cases" step the per-contact worker loop names) rather
/// than a port any of the resolver/index/transmit crates need to know
/// about; contact ownership is checked downstream through the resolver.
pub struct ReleasedCaseSource {
    case_qc: Arc<dyn Cursor>,
}

impl ReleasedCaseSource {
    pub fn new(case_qc: Arc<dyn Cursor>) -> Self {
        Self { case_qc }
    }

    pub async fn released_tracking_ids(&self) -> Vec<String> {
        let all = self.case_qc.query_all("case_qc", "state", "Released").await.unwrap_or_default();
        all.into_iter().filter_map(|row| row.get("tracking_id").cloned()).collect()
    }
}

pub struct PipelineContactWorker {
    released: ReleasedCaseSource,
    resolver: Arc<ViableCaseResolver>,
    documents: DocumentHydrator,
    index_builder: Arc<IndexBuilder>,
    transmit: Arc<TransmitOrchestrator>,
    hooks: Arc<HookRegistry>,
    acord103_repo: Arc<dyn Acord103Repo>,
    acord103_store: Mutex<Acord103Store>,
    history: Arc<DocumentHistoryLog>,
}

impl PipelineContactWorker {
    pub fn new(
        released: ReleasedCaseSource,
        resolver: Arc<ViableCaseResolver>,
        documents: DocumentHydrator,
        index_builder: Arc<IndexBuilder>,
        transmit: Arc<TransmitOrchestrator>,
        hooks: Arc<HookRegistry>,
        acord103_repo: Arc<dyn Acord103Repo>,
        history: Arc<DocumentHistoryLog>,
    ) -> Self {
        Self {
            released,
            resolver,
            documents,
            index_builder,
            transmit,
            hooks,
            acord103_repo,
            acord103_store: Mutex::new(Acord103Store::new()),
            history,
        }
    }

    /// Fetches the live 103 record and writes it into the contact's
    /// `acord103Dir` so [`crate::repos::FileAcord103Source`] can load it
    /// for index field resolution. A case can be `Ready` with no 103 on
    /// file for contacts that don't require one; this is a no-op then.
    async fn materialize_acord103(&self, tracking_id: &str, acord103_dir: &Utf8Path) {
        let Some(record) = self.acord103_repo.by_tracking_id(tracking_id).await else { return };
        let mut store = self.acord103_store.lock().expect("acord103 store lock poisoned");
        store.receive(record);
        if let Err(e) = store.materialize_live_file(tracking_id, acord103_dir) {
            warn!(tracking_id, error = %e, "failed to materialize acord 103 live file");
        }
    }

    /// Resolves one tracking id into a `Case` plus the gate reason that
    /// would let it proceed. Only billable documents with no prior
    /// `transmit` history row for this contact are attached, so a case
    /// that was already fully sent gates `AlreadyTransmitted` on rerun
    /// (the idempotence invariant) while one with a newly-added document
    /// attaches only that document (a partial resend).
    async fn build_case(&self, contact: &Contact, tracking_id: &str) -> Option<(Case, GateReason)> {
        let viable = self.resolver.from_tracking_id(tracking_id).await;
        let sid = viable.sid()?.to_string();

        let mut billable = Vec::new();
        for document_id in &viable.doc_group_ids {
            let Some(mut document) = self.documents.hydrate(document_id).await else { continue };
            let (f_bill, f_send) = contact.billing_flags_for_doc_type(&document.doc_type_name);
            if !f_bill && !f_send {
                continue;
            }
            document.f_bill = f_bill;
            document.f_send = f_send;
            billable.push(document);
        }

        let delivered: HashSet<String> = self
            .history
            .get_tracked_docids_for_case(&sid, &contact.contact_id, HistoryAction::Transmit)
            .await
            .into_iter()
            .map(|(doc_id, _)| doc_id)
            .collect();
        let already_transmitted = !billable.is_empty() && billable.iter().all(|d| delivered.contains(&d.document_id.0));

        let opts = AnalyzeOptions {
            requires_acord103: contact.acord103_dir.is_some(),
            results_dependent_carrier: false,
            orp_coded: false,
            already_transmitted,
            is_restage: false,
        };
        let reason = analyze_case(&viable, &opts);

        let case_id = viable.case_id.clone().unwrap_or_else(|| CaseId::new(&sid));
        let mut case = Case::new(case_id, &sid, tracking_id, &contact.source_code, &contact.contact_id);
        for document in billable.into_iter().filter(|d| !delivered.contains(&d.document_id.0)) {
            case.add_document(document);
        }

        Some((case, reason))
    }

    async fn index_and_collect(&self, contact: &Contact, case: &Case, outcome: &mut WorkerOutcome) -> bool {
        match self.index_builder.build_indexes_for_case(case, contact, self.hooks.index_hooks(contact).as_ref()).await {
            Ok(written) if !written.is_empty() => {
                outcome.indexed += 1;
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(sid = %case.sid, error = %e, "index build failed");
                outcome.errors += 1;
                false
            }
        }
    }
}

#[async_trait]
impl ContactWorker for PipelineContactWorker {
    async fn run_once(&self, contact: &Contact) -> WorkerOutcome {
        let mut outcome = WorkerOutcome::default();

        let tracking_ids = self.released.released_tracking_ids().await;
        let mut ready_cases = Vec::new();

        for tracking_id in tracking_ids {
            let Some((case, reason)) = self.build_case(contact, &tracking_id).await else { continue };
            if case.contact_id != contact.contact_id {
                continue;
            }
            outcome.exported += 1;

            match reason {
                GateReason::Ready => {
                    if let Some(dir) = &contact.acord103_dir {
                        self.materialize_acord103(&tracking_id, dir).await;
                    }
                    if self.index_and_collect(contact, &case, &mut outcome).await {
                        ready_cases.push(case);
                    }
                }
                GateReason::NotFound | GateReason::Cancelled => {}
                _ => {
                    outcome.held += 1;
                    info!(sid = %case.sid, reason = reason.as_str(), "case held, not ready to index");
                }
            }
        }

        if !ready_cases.is_empty() {
            let report = self.transmit.stage_and_transmit_cases(&ready_cases, contact, self.hooks.transmit_hooks(contact).as_ref()).await;
            outcome.transmitted += report.done.len();
            outcome.held += report.held.len();
            outcome.errors += report.error.len() + report.partial.len();
        }

        outcome
    }
}
