use std::sync::Arc;

use asap_history::DocumentHistoryLog;
use asap_model::{Case, Contact, HistoryAction, OnStageExceptionPolicy};
use camino::Utf8Path;
use tracing::{error, info, warn};

use crate::hooks::TransmitHooks;
use crate::outcome::{HookOutcome, TransmitState};

#[derive(Debug, Default)]
pub struct TransmitRunReport {
    pub done: Vec<String>,
    pub held: Vec<String>,
    pub error: Vec<String>,
    pub partial: Vec<String>,
}

/// Per-contact state machine driving `preStage -> isIndexedCaseReady ->
/// stageIndexedCase -> (track transmit history) -> transmitStagedCases ->
/// postTransmit`. History rows are written before the transport attempt
/// so a crash produces an observable "transmitted but not reconciled" row
/// rather than a silent gap.
pub struct TransmitOrchestrator {
    history: Arc<DocumentHistoryLog>,
}

impl TransmitOrchestrator {
    pub fn new(history: Arc<DocumentHistoryLog>) -> Self {
        Self { history }
    }

    pub async fn stage_and_transmit_cases(&self, cases: &[Case], contact: &Contact, hooks: &dyn TransmitHooks) -> TransmitRunReport {
        let mut report = TransmitRunReport::default();

        if let HookOutcome::Failed(reason) = hooks.pre_stage().await {
            error!(contact = %contact.contact_id, reason, "preStage failed; run continues, crash leftovers may remain");
        }

        for case in cases {
            let state = self.process_case(case, contact, hooks).await;
            match state {
                TransmitState::Done => report.done.push(case.sid.clone()),
                TransmitState::Held => report.held.push(case.sid.clone()),
                TransmitState::Error => report.error.push(case.sid.clone()),
                TransmitState::Partial => report.partial.push(case.sid.clone()),
                _ => {}
            }
        }

        report
    }

    async fn process_case(&self, case: &Case, contact: &Contact, hooks: &dyn TransmitHooks) -> TransmitState {
        if !hooks.is_indexed_case_ready(case).await {
            return TransmitState::Held;
        }

        let is_first_transmit = self.history.is_first_transmit(&case.sid, &contact.contact_id).await;
        let is_full_transmit = self.is_full_transmit(case, contact).await;

        match hooks.stage_indexed_case(case, &contact.xmit_dir, is_first_transmit, is_full_transmit).await {
            HookOutcome::Ok => {}
            HookOutcome::Held => return TransmitState::Held,
            HookOutcome::Failed(reason) => {
                warn!(sid = %case.sid, reason, "stageIndexedCase failed");
                return self.handle_stage_failure(contact);
            }
        }

        for document in case.documents() {
            let recorded = self.history.track_document(&case.sid, &document.document_id.0, &contact.contact_id, HistoryAction::Transmit).await;
            if recorded.is_err() {
                error!(sid = %case.sid, doc = %document.document_id, "failed to record transmit history before transport attempt");
                return TransmitState::Error;
            }
        }

        match hooks.transmit_staged_cases(&contact.xmit_dir).await {
            HookOutcome::Ok => {}
            HookOutcome::Held => return TransmitState::Held,
            HookOutcome::Failed(reason) => {
                warn!(sid = %case.sid, reason, "transmitStagedCases failed; zip left for next run");
                return TransmitState::Partial;
            }
        }

        match hooks.post_transmit(case).await {
            HookOutcome::Failed(reason) => {
                warn!(sid = %case.sid, reason, "postTransmit failed, case already transmitted");
            }
            _ => info!(sid = %case.sid, contact = %contact.contact_id, "case transmitted"),
        }

        TransmitState::Done
    }

    fn handle_stage_failure(&self, contact: &Contact) -> TransmitState {
        match contact.on_stage_exception_policy {
            OnStageExceptionPolicy::Restage => TransmitState::Partial,
            OnStageExceptionPolicy::Leave => TransmitState::Error,
        }
    }

    /// Every document currently attached to the case has no prior
    /// `transmit` row. Subsequent partial sends do not re-emit the 103.
    async fn is_full_transmit(&self, case: &Case, contact: &Contact) -> bool {
        let transmitted = self.history.get_tracked_docids_for_case(&case.sid, &contact.contact_id, HistoryAction::Transmit).await;
        if transmitted.is_empty() {
            return true;
        }
        !case.documents().any(|doc| transmitted.iter().any(|(id, _)| id == &doc.document_id.0))
    }
}

/// Rescues files left behind in `xmit_dir` by a crashed previous run, per
/// carrier policy: `review/` for manual triage, `retrans/` for automatic
/// next-run pickup.
pub async fn rescue_crash_leftovers(xmit_dir: &Utf8Path, policy: OnStageExceptionPolicy) -> std::io::Result<Vec<String>> {
    let target_subdir = match policy {
        OnStageExceptionPolicy::Restage => "retrans",
        OnStageExceptionPolicy::Leave => "review",
    };
    let target = xmit_dir.join(target_subdir);
    std::fs::create_dir_all(&target)?;

    let mut moved = Vec::new();
    if !xmit_dir.exists() {
        return Ok(moved);
    }
    for entry in std::fs::read_dir(xmit_dir)?.flatten() {
        if entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy().into_owned();
        std::fs::rename(entry.path(), target.join(&name))?;
        moved.push(name);
    }
    Ok(moved)
}
